//! Utility macros for reducing boilerplate

/// Implement `FromRef<AppState>` so handlers can extract one field of the
/// application state directly.
///
/// # Example
/// ```ignore
/// impl_from_ref!(CachedStore, cached);
/// // Expands to:
/// impl axum::extract::FromRef<AppState> for CachedStore {
///     fn from_ref(state: &AppState) -> Self {
///         state.cached.clone()
///     }
/// }
/// ```
#[macro_export]
macro_rules! impl_from_ref {
    ($type:ty, $field:ident) => {
        impl axum::extract::FromRef<$crate::state::AppState> for $type {
            fn from_ref(state: &$crate::state::AppState) -> Self {
                state.$field.clone()
            }
        }
    };
}
