use super::config::TransformConfig;

/// Turns a mixin's payload into the edits it wants applied.
pub trait MixinInjection<T>: Send + Sync {
    fn apply(&self, data: &T) -> TransformConfig;
}

impl<T, F> MixinInjection<T> for F
where
    F: Fn(&T) -> TransformConfig + Send + Sync,
{
    fn apply(&self, data: &T) -> TransformConfig {
        self(data)
    }
}

/// A payload for one target unit, paired with the injection that interprets it.
pub struct MixinMetadata<T> {
    pub target: String,
    pub data: T,
    pub injection: Box<dyn MixinInjection<T>>,
}

impl<T> MixinMetadata<T> {
    pub fn new(target: &str, data: T, injection: impl MixinInjection<T> + 'static) -> Self {
        Self {
            target: target.to_string(),
            data,
            injection: Box::new(injection),
        }
    }
}

/// Type-erased mixin, as stored by the engine.
pub trait Mixin: Send + Sync {
    fn transform(&self) -> TransformConfig;

    /// The unit this mixin was written for, when it names one.
    fn target(&self) -> Option<&str> {
        None
    }
}

impl<T: Send + Sync> Mixin for MixinMetadata<T> {
    fn transform(&self) -> TransformConfig {
        self.injection.apply(&self.data)
    }

    fn target(&self) -> Option<&str> {
        Some(&self.target)
    }
}

impl Mixin for TransformConfig {
    fn transform(&self) -> TransformConfig {
        self.clone()
    }
}

/// A late-bound contributor of mixins, discovered from an archive.
pub trait MixinExtension: Send + Sync {
    fn name(&self) -> &str;

    /// `(target unit, mixin)` pairs in registration order.
    fn mixins(&self) -> Vec<(String, Box<dyn Mixin>)>;
}
