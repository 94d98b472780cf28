//! PromQL function and aggregation tables

/// A function offered in completions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FunctionDef {
    pub label: &'static str,
    pub insert_text: &'static str,
    pub detail: &'static str,
}

const fn func(label: &'static str, detail: &'static str) -> FunctionDef {
    FunctionDef {
        label,
        insert_text: label,
        detail,
    }
}

/// Aggregation operators. Their first argument slot expects a vector
/// selector, so only metric names are offered there.
pub const AGGREGATIONS: &[&str] = &[
    "sum",
    "min",
    "max",
    "avg",
    "group",
    "stddev",
    "stdvar",
    "count",
    "count_values",
    "bottomk",
    "topk",
    "quantile",
    "limitk",
    "limit_ratio",
];

/// Every function and aggregation, in the order they are offered
pub const FUNCTIONS: &[FunctionDef] = &[
    func("sum", "Calculate sum over dimensions"),
    func("min", "Select minimum over dimensions"),
    func("max", "Select maximum over dimensions"),
    func("avg", "Calculate the average over dimensions"),
    func("group", "All values in the resulting vector are 1"),
    func("stddev", "Calculate population standard deviation over dimensions"),
    func("stdvar", "Calculate population standard variance over dimensions"),
    func("count", "Count number of elements in the vector"),
    func("count_values", "Count number of elements with the same value"),
    func("bottomk", "Smallest k elements by sample value"),
    func("topk", "Largest k elements by sample value"),
    func("quantile", "Calculate φ-quantile (0 ≤ φ ≤ 1) over dimensions"),
    func("limitk", "Sample n elements"),
    func("limit_ratio", "Sample elements with approximately r ratio"),
    func("abs", "Returns the input vector with all sample values converted to their absolute value"),
    func("absent", "Returns an empty vector if the vector passed to it has any elements and a 1-element vector with the value 1 if the vector passed to it has no elements"),
    func("absent_over_time", "Returns an empty vector if the range vector passed to it has any elements and a 1-element vector with the value 1 if the range vector passed to it has no elements"),
    func("acos", "Calculates the arccosine of all elements in v"),
    func("asin", "Calculates the arcsine of all elements in v"),
    func("atan", "Calculates the arctangent of all elements in v"),
    func("avg_over_time", "The average value of all points in the specified interval"),
    func("ceil", "Rounds the sample values of all elements in v up to the nearest integer"),
    func("changes", "For each input time series, returns the number of times its value has changed within the provided time range"),
    func("clamp", "Clamps the sample values of all elements to have a lower limit of min and an upper limit of max"),
    func("clamp_max", "Clamps the sample values of all elements to have an upper limit of max"),
    func("clamp_min", "Clamps the sample values of all elements to have a lower limit of min"),
    func("cos", "Calculates the cosine of all elements in v"),
    func("count_over_time", "The count of all values in the specified interval"),
    func("day_of_month", "Returns the day of the month for each of the given times in UTC"),
    func("day_of_week", "Returns the day of the week for each of the given times in UTC"),
    func("day_of_year", "Returns the day of the year for each of the given times in UTC"),
    func("days_in_month", "Returns number of days in the month for each of the given times in UTC"),
    func("deg", "Converts radians to degrees for all elements in v"),
    func("delta", "Calculates the difference between the first and last value of each time series element in a range vector"),
    func("deriv", "Calculates the per-second derivative of the time series in a range vector using simple linear regression"),
    func("exp", "Calculates the exponential function for all elements in v"),
    func("floor", "Rounds the sample values of all elements in v down to the nearest integer"),
    func("histogram_quantile", "Calculates the φ-quantile (0 ≤ φ ≤ 1) from the buckets of a histogram"),
    func("holt_winters", "Produces a smoothed value for time series based on the range in v"),
    func("hour", "Returns the hour of the day for each of the given times in UTC"),
    func("idelta", "Calculates the difference between the last two samples in the range vector"),
    func("increase", "Calculates the increase in the time series in the range vector"),
    func("irate", "Calculates the per-second instant rate of increase of the time series in the range vector, based on the last two data points"),
    func("label_join", "Joins the values of the source labels into a new destination label"),
    func("label_replace", "Matches the regular expression against the value of a source label and writes the replacement into a destination label"),
    func("last_over_time", "The most recent point value in the specified interval"),
    func("ln", "Calculates the natural logarithm for all elements in v"),
    func("log10", "Calculates the decimal logarithm for all elements in v"),
    func("log2", "Calculates the binary logarithm for all elements in v"),
    func("max_over_time", "The maximum value of all points in the specified interval"),
    func("min_over_time", "The minimum value of all points in the specified interval"),
    func("minute", "Returns the minute of the hour for each of the given times in UTC"),
    func("month", "Returns the month of the year for each of the given times in UTC"),
    func("pi", "Returns pi"),
    func("predict_linear", "Predicts the value of time series t seconds from now, based on the range vector v, using simple linear regression"),
    func("present_over_time", "The value 1 for any series in the specified interval"),
    func("quantile_over_time", "The φ-quantile (0 ≤ φ ≤ 1) of the values in the specified interval"),
    func("rad", "Converts degrees to radians for all elements in v"),
    func("rate", "Calculates the per-second average rate of increase of the time series in the range vector"),
    func("resets", "For each input time series, returns the number of counter resets within the provided time range"),
    func("round", "Rounds the sample values of all elements in v to the nearest integer"),
    func("scalar", "Returns the sample value of a single-element vector as a scalar"),
    func("sgn", "Returns the sign of all elements in v"),
    func("sin", "Calculates the sine of all elements in v"),
    func("sort", "Returns vector elements sorted by their sample values, in ascending order"),
    func("sort_desc", "Returns vector elements sorted by their sample values, in descending order"),
    func("sqrt", "Calculates the square root of all elements in v"),
    func("stddev_over_time", "The population standard deviation of the values in the specified interval"),
    func("stdvar_over_time", "The population standard variance of the values in the specified interval"),
    func("sum_over_time", "The sum of all values in the specified interval"),
    func("tan", "Calculates the tangent of all elements in v"),
    func("time", "Returns the number of seconds since January 1, 1970 UTC"),
    func("timestamp", "Returns the timestamp of each of the samples of the given vector"),
    func("vector", "Returns the scalar as a vector with no labels"),
    func("year", "Returns the year for each of the given times in UTC"),
];

/// Whether `name` is an aggregation operator
pub fn is_aggregation(name: &str) -> bool {
    AGGREGATIONS.contains(&name)
}

/// Look up a function by name
pub fn find_function(name: &str) -> Option<&'static FunctionDef> {
    FUNCTIONS.iter().find(|f| f.label == name)
}

/// PromQL keywords that are never metric names
pub const KEYWORDS: &[&str] = &[
    "by",
    "without",
    "on",
    "ignoring",
    "group_left",
    "group_right",
    "bool",
    "offset",
    "and",
    "or",
    "unless",
    "atan2",
];

pub fn is_keyword(word: &str) -> bool {
    KEYWORDS.contains(&word)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_every_aggregation_is_a_function() {
        for agg in AGGREGATIONS {
            assert!(find_function(agg).is_some(), "{agg} missing from FUNCTIONS");
        }
    }

    #[test]
    fn test_function_labels_unique() {
        let labels: HashSet<_> = FUNCTIONS.iter().map(|f| f.label).collect();
        assert_eq!(labels.len(), FUNCTIONS.len());
    }

    #[test]
    fn test_insert_text_matches_label() {
        assert!(FUNCTIONS.iter().all(|f| f.insert_text == f.label));
        assert!(FUNCTIONS.iter().all(|f| !f.detail.is_empty()));
    }

    #[test]
    fn test_lookup() {
        assert!(is_aggregation("topk"));
        assert!(!is_aggregation("rate"));
        assert_eq!(find_function("rate").map(|f| f.label), Some("rate"));
        assert!(find_function("nope").is_none());
        assert!(is_keyword("without"));
    }
}
