/// Read access to the bootloader environment.
pub trait Environment {
    /// Returns the value of `name`, if set.
    fn get(&self, name: &str) -> Option<&str>;
}

impl<E: Environment + ?Sized> Environment for &E {
    fn get(&self, name: &str) -> Option<&str> {
        (**self).get(name)
    }
}
