use justconfig::error::ConfigError;
use justconfig::item::{MapAction, StringItem};

/// Remove quotes from configuration strings.
pub trait Unquote
where
    Self: Sized,
{
    fn unquote(self) -> Result<StringItem, ConfigError>;
}

impl Unquote for Result<StringItem, ConfigError> {
    /// Trims every value and strips one pair of matching surrounding quotes,
    /// either `"..."` or `'...'`. Values without quotes are kept as they are,
    /// so `data.groundtruth_path = truth.csv` and
    /// `data.groundtruth_path = "truth.csv"` mean the same.
    fn unquote(self) -> Result<StringItem, ConfigError> {
        self?.map(|v| match strip_quotes(v.trim()) {
            Some(inner) => MapAction::Replace(vec![inner.to_owned()]),
            None => MapAction::Keep,
        })
    }
}

fn strip_quotes(value: &str) -> Option<&str> {
    ['"', '\''].iter().find_map(|quote| {
        value
            .strip_prefix(*quote)
            .and_then(|rest| rest.strip_suffix(*quote))
    })
}
