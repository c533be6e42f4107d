use crate::error::{CoreError, Result};
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

pub const WEI_PER_ETHER: u128 = 1_000_000_000_000_000_000;
const ETHER_DECIMALS: usize = 18;

/// Currency amount in wei
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Amount(u128);

impl Amount {
    pub const ZERO: Amount = Amount(0);

    pub const fn from_wei(wei: u128) -> Self {
        Self(wei)
    }

    pub const fn to_wei(self) -> u128 {
        self.0
    }

    /// Parse a decimal ether string such as `"0.125"` (at most 18 fractional digits)
    pub fn from_ether(value: &str) -> Result<Self> {
        let value = value.trim();
        if value.is_empty() {
            return Err(CoreError::invalid_amount("empty amount"));
        }

        let (whole, frac) = match value.split_once('.') {
            Some((whole, frac)) => (whole, frac),
            None => (value, ""),
        };

        let all_digits = |s: &str| s.chars().all(|c| c.is_ascii_digit());
        if !all_digits(whole) || !all_digits(frac) {
            return Err(CoreError::invalid_amount(format!("'{}' is not a number", value)));
        }
        if value.contains('.') && frac.is_empty() {
            return Err(CoreError::invalid_amount(format!("'{}' has an empty fraction", value)));
        }
        if frac.len() > ETHER_DECIMALS {
            return Err(CoreError::invalid_amount(format!(
                "'{}' has more than {} decimals",
                value, ETHER_DECIMALS
            )));
        }

        let overflow = || CoreError::invalid_amount(format!("'{}' is too large", value));

        let whole_wei = if whole.is_empty() {
            0
        } else {
            whole
                .parse::<u128>()
                .map_err(|_| overflow())?
                .checked_mul(WEI_PER_ETHER)
                .ok_or_else(overflow)?
        };

        let frac_wei = if frac.is_empty() {
            0
        } else {
            let padded = format!("{:0<width$}", frac, width = ETHER_DECIMALS);
            padded.parse::<u128>().map_err(|_| overflow())?
        };

        whole_wei
            .checked_add(frac_wei)
            .map(Self)
            .ok_or_else(overflow)
    }

    /// Decimal ether representation without trailing zeros
    pub fn to_ether_string(self) -> String {
        let whole = self.0 / WEI_PER_ETHER;
        let frac = self.0 % WEI_PER_ETHER;
        if frac == 0 {
            return whole.to_string();
        }
        let frac = format!("{:0>width$}", frac, width = ETHER_DECIMALS);
        format!("{}.{}", whole, frac.trim_end_matches('0'))
    }

    pub fn is_zero(self) -> bool {
        self.0 == 0
    }

    pub fn checked_add(self, rhs: Amount) -> Option<Amount> {
        self.0.checked_add(rhs.0).map(Self)
    }

    pub fn checked_sub(self, rhs: Amount) -> Option<Amount> {
        self.0.checked_sub(rhs.0).map(Self)
    }

    pub fn checked_mul(self, factor: u128) -> Option<Amount> {
        self.0.checked_mul(factor).map(Self)
    }

    pub fn saturating_add(self, rhs: Amount) -> Amount {
        Self(self.0.saturating_add(rhs.0))
    }

    pub fn half(self) -> Amount {
        Self(self.0 / 2)
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ETH", self.to_ether_string())
    }
}

// wei as a decimal string; u128 does not fit JSON numbers or SQLite integers
impl Serialize for Amount {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0.to_string())
    }
}

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse::<u128>()
            .map(Self)
            .map_err(serde::de::Error::custom)
    }
}

impl ToSql for Amount {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.0.to_string()))
    }
}

impl FromSql for Amount {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let raw = value.as_str()?;
        raw.parse::<u128>()
            .map(Self)
            .map_err(|e| FromSqlError::Other(Box::new(e)))
    }
}

/// Identity of a party interacting with the house
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Account(String);

impl Account {
    pub fn new(name: impl Into<String>) -> Result<Self> {
        let name = name.into().trim().to_lowercase();
        if name.is_empty() {
            return Err(CoreError::InvalidAccount("account name cannot be empty".to_string()));
        }
        if !name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            return Err(CoreError::InvalidAccount(name));
        }
        Ok(Self(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Account {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Account {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        Self::new(s)
    }
}

impl TryFrom<String> for Account {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self> {
        Self::new(value)
    }
}

impl From<Account> for String {
    fn from(account: Account) -> Self {
        account.0
    }
}

impl ToSql for Account {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.0.as_str()))
    }
}

impl FromSql for Account {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        Account::new(value.as_str()?).map_err(|e| FromSqlError::Other(Box::new(e)))
    }
}

/// Opaque token correlating a wager with its randomness fulfillment
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RequestId([u8; 32]);

impl RequestId {
    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// First bytes of the id, for tables
    pub fn short(&self) -> String {
        format!("0x{}", hex::encode(&self.0[..6]))
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RequestId({})", self)
    }
}

impl FromStr for RequestId {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        let digits = s.trim().trim_start_matches("0x");
        let bytes = hex::decode(digits).map_err(|_| CoreError::InvalidRequestId(s.to_string()))?;
        let bytes: [u8; 32] = bytes
            .try_into()
            .map_err(|_| CoreError::InvalidRequestId(s.to_string()))?;
        Ok(Self(bytes))
    }
}

impl TryFrom<String> for RequestId {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<RequestId> for String {
    fn from(id: RequestId) -> Self {
        id.to_string()
    }
}

impl ToSql for RequestId {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.to_string()))
    }
}

impl FromSql for RequestId {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|e: CoreError| FromSqlError::Other(Box::new(e)))
    }
}

/// The two racers a bet can be placed on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Turtle {
    One,
    Two,
}

impl Turtle {
    pub fn selector(self) -> u8 {
        match self {
            Turtle::One => 1,
            Turtle::Two => 2,
        }
    }

    pub fn other(self) -> Turtle {
        match self {
            Turtle::One => Turtle::Two,
            Turtle::Two => Turtle::One,
        }
    }
}

impl TryFrom<u8> for Turtle {
    type Error = CoreError;

    fn try_from(selector: u8) -> Result<Self> {
        match selector {
            1 => Ok(Turtle::One),
            2 => Ok(Turtle::Two),
            other => Err(CoreError::InvalidTurtle(other)),
        }
    }
}

impl From<Turtle> for u8 {
    fn from(turtle: Turtle) -> Self {
        turtle.selector()
    }
}

impl fmt::Display for Turtle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Turtle {}", self.selector())
    }
}

/// A wager waiting for its randomness fulfillment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bet {
    pub amount: Amount,
    pub bet_on: Turtle,
    pub bettor: Account,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ether_parsing() {
        assert_eq!(Amount::from_ether("1").unwrap().to_wei(), WEI_PER_ETHER);
        assert_eq!(
            Amount::from_ether("0.125").unwrap().to_wei(),
            125_000_000_000_000_000
        );
        assert_eq!(Amount::from_ether(".5").unwrap().to_wei(), WEI_PER_ETHER / 2);
        assert_eq!(
            Amount::from_ether("0.000000000000000001").unwrap().to_wei(),
            1
        );

        assert!(Amount::from_ether("").is_err());
        assert!(Amount::from_ether("1.").is_err());
        assert!(Amount::from_ether("-1").is_err());
        assert!(Amount::from_ether("1e18").is_err());
        assert!(Amount::from_ether("0.0000000000000000001").is_err());
    }

    #[test]
    fn test_ether_formatting() {
        assert_eq!(Amount::from_wei(WEI_PER_ETHER).to_ether_string(), "1");
        assert_eq!(Amount::from_wei(WEI_PER_ETHER / 8).to_ether_string(), "0.125");
        assert_eq!(Amount::from_wei(1).to_ether_string(), "0.000000000000000001");
        assert_eq!(Amount::ZERO.to_string(), "0 ETH");
    }

    #[test]
    fn test_amount_json_is_decimal_string() {
        let amount = Amount::from_wei(u128::MAX);
        let json = serde_json::to_string(&amount).unwrap();
        assert_eq!(json, format!("\"{}\"", u128::MAX));
        assert_eq!(serde_json::from_str::<Amount>(&json).unwrap(), amount);
    }

    #[test]
    fn test_turtle_selector() {
        assert_eq!(Turtle::try_from(1).unwrap(), Turtle::One);
        assert_eq!(Turtle::try_from(2).unwrap(), Turtle::Two);
        assert!(matches!(Turtle::try_from(0), Err(CoreError::InvalidTurtle(0))));
        assert!(matches!(Turtle::try_from(3), Err(CoreError::InvalidTurtle(3))));
        assert_eq!(Turtle::One.other(), Turtle::Two);
        assert!(serde_json::from_str::<Turtle>("7").is_err());
    }

    #[test]
    fn test_request_id_parsing() {
        let raw = "0x211f54d247f5c490e38753da457d612a92f7168b269d187aed0e63bc93b50e37";
        let id: RequestId = raw.parse().unwrap();
        assert_eq!(id.to_string(), raw);
        assert_eq!(id.short(), "0x211f54d247f5");
        assert_eq!(raw.trim_start_matches("0x").parse::<RequestId>().unwrap(), id);
        assert!("0x1234".parse::<RequestId>().is_err());
    }

    #[test]
    fn test_account_normalization() {
        assert_eq!(Account::new(" Alice ").unwrap().as_str(), "alice");
        assert!(Account::new("").is_err());
        assert!(Account::new("bob smith").is_err());
    }
}
