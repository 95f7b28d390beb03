/// `ECSQLOPTIONS` of a statement
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Options {
    /// Do not restrict UPDATE and DELETE to the rows of the target classes
    pub no_class_id_filter: bool,

    /// Allow UPDATE to set readonly properties
    pub readonly_properties_are_updatable: bool,
}
