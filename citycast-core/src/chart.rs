use tracing::debug;

use crate::model::ChartProjection;

/// The surface a temperature chart is drawn on.
pub trait ChartTarget {
    type Handle;

    fn create(&mut self, title: &str, projection: &ChartProjection) -> Self::Handle;
    fn dispose(&mut self, handle: Self::Handle);
}

/// Holds at most one live chart on a target.
///
/// The previous chart is disposed before a new one is created, and whatever
/// is live is disposed on `clear` and on drop.
pub struct ChartSlot<T: ChartTarget> {
    target: T,
    live: Option<T::Handle>,
}

impl<T: ChartTarget> ChartSlot<T> {
    pub fn new(target: T) -> Self {
        Self { target, live: None }
    }

    pub fn render(&mut self, title: &str, projection: &ChartProjection) {
        self.clear();
        debug!(points = projection.len(), "Creating chart");
        self.live = Some(self.target.create(title, projection));
    }

    pub fn clear(&mut self) {
        if let Some(handle) = self.live.take() {
            debug!("Disposing chart");
            self.target.dispose(handle);
        }
    }

    pub fn is_live(&self) -> bool {
        self.live.is_some()
    }
}

impl<T: ChartTarget> Drop for ChartSlot<T> {
    fn drop(&mut self) {
        self.clear();
    }
}
