/// Projects a model onto a render-ready view state.
///
/// `present` is pure and total: every reachable model maps to exactly one
/// view state, and the presenter never triggers effects.  Sorting, filtering,
/// icon selection and text formatting all live here.  Anything the projection
/// depends on besides the model (reference time, colors, the current user) is
/// a constructor-supplied field.
pub trait Presenter: Send + Sync + 'static {
    type Model;

    /// Compared against the previous value so the loop can skip redundant
    /// publications.
    type ViewState: Clone + PartialEq + Send + Sync + 'static;

    fn present(&self, model: &Self::Model) -> Self::ViewState;
}

/// A [`Presenter`] backed by a plain function.
pub struct FnPresenter<M, V> {
    f: fn(&M) -> V,
}

impl<M, V> FnPresenter<M, V> {
    pub fn new(f: fn(&M) -> V) -> Self {
        Self { f }
    }
}

impl<M, V> Presenter for FnPresenter<M, V>
where
    M: 'static,
    V: Clone + PartialEq + Send + Sync + 'static,
{
    type Model = M;
    type ViewState = V;

    fn present(&self, model: &M) -> V {
        (self.f)(model)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fn_presenter_projects() {
        let presenter = FnPresenter::new(|n: &i32| format!("count {n}"));
        assert_eq!(presenter.present(&4), "count 4");
    }
}
