//! Convenience macros for app development.

/// Builds a [`ResultMap`](crate::hooks::definitions::ResultMap) from
/// `key => value` pairs. Values go through `serde_json::json!`.
///
/// # Example
/// ```rust,ignore
/// let result = result_map!("test-value" => 7, "ok" => true);
/// ```
#[macro_export]
macro_rules! result_map {
    () => {
        $crate::hooks::definitions::ResultMap::new()
    };
    ($($key:expr => $value:expr),+ $(,)?) => {{
        let mut map = $crate::hooks::definitions::ResultMap::new();
        $(
            map.insert(::std::string::ToString::to_string(&$key), $crate::serde_json::json!($value));
        )+
        map
    }};
}
