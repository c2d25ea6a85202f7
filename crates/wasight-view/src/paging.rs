use tracing::debug;

/// Default number of rows materialized per growth step.
pub const DEFAULT_BATCH_SIZE: usize = 500;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PageError {
    #[error("row {index} is not loaded ({loaded} rows loaded)")]
    OutOfRange { index: usize, loaded: usize },
}

#[derive(Debug, Clone)]
enum State<R> {
    Empty,
    Bound { view: Vec<R>, loaded: usize },
}

/// Exposes a filtered view to a list in fixed-size batches.
///
/// Growth is append-only: rows already exposed keep their index until the
/// next `bind`.
#[derive(Debug, Clone)]
pub struct Pager<R> {
    batch_size: usize,
    state: State<R>,
}

impl<R> Pager<R> {
    /// A batch size of zero is treated as one.
    pub fn new(batch_size: usize) -> Self {
        Self {
            batch_size: batch_size.max(1),
            state: State::Empty,
        }
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Replace the view and reset the loaded count to zero.
    pub fn bind(&mut self, view: Vec<R>) {
        debug!("Pager bound to {} rows", view.len());
        self.state = State::Bound { view, loaded: 0 };
    }

    pub fn unbind(&mut self) {
        self.state = State::Empty;
    }

    pub fn is_bound(&self) -> bool {
        matches!(self.state, State::Bound { .. })
    }

    pub fn loaded(&self) -> usize {
        match &self.state {
            State::Empty => 0,
            State::Bound { loaded, .. } => *loaded,
        }
    }

    /// Rows in the bound view, loaded or not.
    pub fn total(&self) -> usize {
        match &self.state {
            State::Empty => 0,
            State::Bound { view, .. } => view.len(),
        }
    }

    pub fn can_grow(&self) -> bool {
        self.loaded() < self.total()
    }

    /// Expose up to one more batch. Returns the index range that became
    /// visible; empty when already exhausted.
    pub fn grow(&mut self) -> std::ops::Range<usize> {
        let batch = self.batch_size;
        match &mut self.state {
            State::Empty => 0..0,
            State::Bound { view, loaded } => {
                let start = *loaded;
                let step = batch.min(view.len() - start);
                *loaded += step;
                if step > 0 {
                    debug!("Pager grew to {} of {} rows", *loaded, view.len());
                }
                start..*loaded
            }
        }
    }

    pub fn row_at(&self, index: usize) -> Result<&R, PageError> {
        match &self.state {
            State::Bound { view, loaded } if index < *loaded => Ok(&view[index]),
            _ => Err(PageError::OutOfRange {
                index,
                loaded: self.loaded(),
            }),
        }
    }

    /// The currently exposed rows.
    pub fn loaded_rows(&self) -> &[R] {
        match &self.state {
            State::Empty => &[],
            State::Bound { view, loaded } => &view[..*loaded],
        }
    }
}
