use serde::Deserialize;

/// Switches controlling how rows are mapped.
///
/// Deserializes from any serde format; missing fields take their defaults.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Which result maps map unlisted columns automatically
    pub auto_mapping_behavior: AutoMappingBehavior,

    /// What automatic mapping does with a column it cannot place
    pub auto_mapping_unknown_column_behavior: UnknownColumnBehavior,

    /// Match `FIRST_NAME` to `firstName` during automatic mapping
    pub map_underscore_to_camel_case: bool,

    /// Write null column values to nullable properties instead of skipping
    /// them
    pub call_setters_on_nulls: bool,

    /// Produce an empty instance, rather than null, for a row whose columns
    /// are all null
    pub return_instance_for_empty_row: bool,

    /// Read column labels rather than column names
    pub use_column_label: bool,

    /// Reject paging bounds on statements with nested result maps
    pub safe_row_bounds_enabled: bool,

    /// Reject custom result handlers on nested, unordered statements
    pub safe_result_handler_enabled: bool,

    /// Defer nested queries until their property is read
    pub lazy_loading_enabled: bool,

    /// Load every deferred property on the first access to any property
    pub aggressive_lazy_loading: bool,

    pub lazy_load_trigger_methods: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AutoMappingBehavior {
    /// Never map unlisted columns
    None,

    /// Map unlisted columns only for result maps without nested result maps
    Partial,

    /// Map unlisted columns everywhere
    Full,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnknownColumnBehavior {
    /// Skip the column silently
    None,

    /// Log a warning and skip the column
    Warning,

    /// Fail the statement
    Failing,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            auto_mapping_behavior: AutoMappingBehavior::Partial,
            auto_mapping_unknown_column_behavior: UnknownColumnBehavior::None,
            map_underscore_to_camel_case: false,
            call_setters_on_nulls: false,
            return_instance_for_empty_row: false,
            use_column_label: true,
            safe_row_bounds_enabled: false,
            safe_result_handler_enabled: true,
            lazy_loading_enabled: false,
            aggressive_lazy_loading: false,
            lazy_load_trigger_methods: ["equals", "clone", "hashCode", "toString"]
                .into_iter()
                .map(String::from)
                .collect(),
        }
    }
}

impl Settings {
    pub fn lazy_options(&self) -> crate::object::LazyOptions {
        crate::object::LazyOptions {
            aggressive: self.aggressive_lazy_loading,
            trigger_methods: self.lazy_load_trigger_methods.clone(),
        }
    }
}
