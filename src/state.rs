use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;

use crate::color::ColorMap;
use crate::config::DashboardConfig;
use crate::data::filter::{Choice, Dimension, FilterSelections, Selection};
use crate::data::pipeline::{Cycle, FilterOptions, PipelineError, run_cycle};

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// What the last render cycle left on screen.
pub enum View {
    /// No cycle has run yet.
    Pending,
    /// Load or schema failure; nothing but the message is shown.
    Halted(PipelineError),
    /// The cycle completed, either rendered or with no matching rows.
    Ready(Cycle),
}

/// The full UI state, independent of rendering.
pub struct AppState {
    /// Dataset file re-read on every cycle.
    pub data_path: PathBuf,

    /// Ticked entries of each multi-select ("All" and/or values).
    pub choices: BTreeMap<Dimension, BTreeSet<Choice>>,

    /// Result of the latest cycle.
    pub view: View,

    /// Gender colours, built from the unfiltered table.
    pub color_map: Option<ColorMap>,

    /// Set by any interaction; the next frame runs a fresh cycle.
    pub dirty: bool,
}

impl AppState {
    pub fn new(config: &DashboardConfig) -> Self {
        Self {
            data_path: config.data_path.clone(),
            choices: default_choices(),
            view: View::Pending,
            color_map: None,
            dirty: true,
        }
    }

    /// Current multi-select state as filter selections.
    pub fn selections(&self) -> FilterSelections {
        let mut selections = FilterSelections::default();
        for (dim, ticked) in &self.choices {
            *selections.get_mut(*dim) = Selection::from_choices(ticked);
        }
        selections
    }

    /// Run a full cycle if anything changed since the last one.
    pub fn refresh(&mut self) {
        if !self.dirty {
            return;
        }
        self.dirty = false;

        match run_cycle(&self.data_path, &self.selections()) {
            Ok(cycle) => {
                self.prune_choices(&cycle.options);
                self.color_map = Some(ColorMap::new(&cycle.options.gender));
                self.view = View::Ready(cycle);
            }
            Err(e) => {
                log::error!("Render cycle halted: {e}");
                self.color_map = None;
                self.view = View::Halted(e);
            }
        }
    }

    /// Untick values the reloaded data no longer offers.  They matched no
    /// rows, so the cycle's outcome is unchanged.
    fn prune_choices(&mut self, options: &FilterOptions) {
        for (dim, ticked) in &mut self.choices {
            let offered = options.get(*dim);
            ticked.retain(|choice| match choice {
                Choice::All => true,
                Choice::Value(v) => offered.contains(v),
            });
        }
    }

    pub fn is_ticked(&self, dimension: Dimension, choice: &Choice) -> bool {
        self.choices
            .get(&dimension)
            .is_some_and(|ticked| ticked.contains(choice))
    }

    /// Tick or untick a single entry of a multi-select.
    pub fn set_ticked(&mut self, dimension: Dimension, choice: Choice, ticked: bool) {
        let set = self.choices.entry(dimension).or_default();
        let changed = if ticked {
            set.insert(choice)
        } else {
            set.remove(&choice)
        };
        self.dirty |= changed;
    }

    /// Switch to another dataset file; selections go back to "All".
    pub fn set_data_path(&mut self, path: PathBuf) {
        log::info!("Switching dataset to {}", path.display());
        self.data_path = path;
        self.choices = default_choices();
        self.dirty = true;
    }

    /// Re-run the cycle without changing anything.
    pub fn reload(&mut self) {
        self.dirty = true;
    }
}

fn default_choices() -> BTreeMap<Dimension, BTreeSet<Choice>> {
    Dimension::ALL
        .iter()
        .map(|&d| (d, BTreeSet::from([Choice::All])))
        .collect()
}
