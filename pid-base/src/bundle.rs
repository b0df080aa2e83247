use pid::Registry;

/// Groups related registrations behind one call.
///
/// # Examples
///
/// ```rust
/// use pid::{Component, Registry};
/// use pid_base::BundleExt as _;
///
/// struct Clock;
/// struct ClockModule;
///
/// fn clock_bundle(registry: &mut Registry) {
///     registry
///         .register(Component::<Clock>::injectable().factory(|_| Ok(Clock)))
///         .register(
///             Component::<ClockModule>::module()
///                 .provider::<Clock>()
///                 .export::<Clock>()
///                 .factory(|_| Ok(ClockModule)),
///         );
/// }
///
/// let mut registry = Registry::new();
/// registry.add_bundle(clock_bundle);
/// assert!(registry.is_injectable::<ClockModule>());
/// ```
pub trait BundleExt {
    fn add_bundle<F>(&mut self, func: F) -> &mut Self
    where
        F: FnOnce(&mut Self),
        Self: Sized;
}

impl BundleExt for Registry {
    fn add_bundle<F>(&mut self, func: F) -> &mut Self
    where
        F: FnOnce(&mut Self),
        Self: Sized,
    {
        func(self);
        self
    }
}
