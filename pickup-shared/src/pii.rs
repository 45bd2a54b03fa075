use serde::{Deserialize, Serialize, Serializer};
use std::fmt;

/// A wrapper for sensitive data (phone numbers, delivery addresses) that masks
/// its value in Debug and Display output. Only the last two characters survive.
#[derive(Clone, Deserialize, PartialEq, Eq)]
pub struct Masked<T>(pub T);

impl<T: AsRef<str>> Masked<T> {
    fn redacted(&self) -> String {
        let chars: Vec<char> = self.0.as_ref().chars().collect();
        if chars.len() <= 4 {
            return "********".to_string();
        }
        let tail: String = chars[chars.len() - 2..].iter().collect();
        format!("******{}", tail)
    }
}

impl<T: AsRef<str>> fmt::Debug for Masked<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.redacted())
    }
}

impl<T: AsRef<str>> fmt::Display for Masked<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.redacted())
    }
}

impl<T: Serialize> Serialize for Masked<T> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        // The notifier needs the real address; masking only applies to log output.
        self.0.serialize(serializer)
    }
}

impl<T> Masked<T> {
    pub fn inner(&self) -> &T {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phone_number_is_masked_in_logs() {
        let phone = Masked("+15551234567".to_string());
        assert_eq!(format!("{}", phone), "******67");
        assert_eq!(format!("{:?}", phone), "******67");
        assert_eq!(phone.inner(), "+15551234567");
    }

    #[test]
    fn test_short_values_fully_masked() {
        let short = Masked("123");
        assert_eq!(format!("{}", short), "********");
    }

    #[test]
    fn test_serialization_keeps_value() {
        let phone = Masked("+15551234567".to_string());
        assert_eq!(serde_json::to_string(&phone).unwrap(), "\"+15551234567\"");
    }
}
