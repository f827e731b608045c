// ==========================================
// FuelEU 合规系统 - 字段编解码
// ==========================================
// 时间: RFC 3339 UTC 微秒（定宽，字典序即时间序）
// 枚举: 存储 as_str()，读取 FromStr
// ==========================================

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::types::Type;
use std::str::FromStr;

/// 时间戳写入格式
pub fn ts_to_db(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// 时间戳读取
pub fn ts_from_db(idx: usize, raw: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

/// 枚举字段读取
pub fn enum_from_db<T>(idx: usize, raw: &str) -> rusqlite::Result<T>
where
    T: FromStr<Err = String>,
{
    raw.parse::<T>()
        .map_err(|msg| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, msg.into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::VesselType;

    #[test]
    fn test_timestamp_is_fixed_width_and_roundtrips() {
        let ts = DateTime::parse_from_rfc3339("2025-03-01T08:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        let s = ts_to_db(&ts);
        assert_eq!(s, "2025-03-01T08:00:00.000000Z");
        assert_eq!(ts_from_db(0, &s).unwrap(), ts);
        assert!(ts_from_db(0, "yesterday").is_err());
    }

    #[test]
    fn test_enum_from_db() {
        assert_eq!(enum_from_db::<VesselType>(1, "Tanker").unwrap(), VesselType::Tanker);
        assert!(enum_from_db::<VesselType>(1, "Canoe").is_err());
    }
}
