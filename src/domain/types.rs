// ==========================================
// FuelEU 合规系统 - 领域类型定义
// ==========================================
// 依据: FuelEU Maritime 法规 - 船型/燃料分类
// 说明: 船型 (vessel type) 在本系统中同时充当船舶标识 (ship_id)
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ==========================================
// 船型 (Vessel Type)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VesselType {
    Container,    // 集装箱船
    BulkCarrier,  // 散货船
    Tanker,       // 油轮
    RoRo,         // 滚装船
    Passenger,    // 客船
    CruiseShip,   // 邮轮
    GeneralCargo, // 杂货船
}

impl VesselType {
    /// 全部船型（按固定顺序）
    pub const ALL: [VesselType; 7] = [
        VesselType::Container,
        VesselType::BulkCarrier,
        VesselType::Tanker,
        VesselType::RoRo,
        VesselType::Passenger,
        VesselType::CruiseShip,
        VesselType::GeneralCargo,
    ];

    /// 数据库/接口使用的字符串表示
    pub fn as_str(&self) -> &'static str {
        match self {
            VesselType::Container => "Container",
            VesselType::BulkCarrier => "BulkCarrier",
            VesselType::Tanker => "Tanker",
            VesselType::RoRo => "RoRo",
            VesselType::Passenger => "Passenger",
            VesselType::CruiseShip => "CruiseShip",
            VesselType::GeneralCargo => "GeneralCargo",
        }
    }
}

impl fmt::Display for VesselType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for VesselType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        VesselType::ALL
            .iter()
            .copied()
            .find(|v| v.as_str() == s.trim())
            .ok_or_else(|| format!("未知船型: {}", s))
    }
}

// ==========================================
// 燃料类型 (Fuel Type)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FuelType {
    #[serde(rename = "HFO")]
    Hfo, // 重质燃料油
    #[serde(rename = "LNG")]
    Lng, // 液化天然气
    #[serde(rename = "MGO")]
    Mgo, // 船用轻柴油
    #[serde(rename = "MDO")]
    Mdo, // 船用柴油
    #[serde(rename = "VLSFO")]
    Vlsfo, // 超低硫燃料油
    Methanol,
    Ammonia,
    Hydrogen,
    Biofuel,
}

impl FuelType {
    pub const ALL: [FuelType; 9] = [
        FuelType::Hfo,
        FuelType::Lng,
        FuelType::Mgo,
        FuelType::Mdo,
        FuelType::Vlsfo,
        FuelType::Methanol,
        FuelType::Ammonia,
        FuelType::Hydrogen,
        FuelType::Biofuel,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FuelType::Hfo => "HFO",
            FuelType::Lng => "LNG",
            FuelType::Mgo => "MGO",
            FuelType::Mdo => "MDO",
            FuelType::Vlsfo => "VLSFO",
            FuelType::Methanol => "Methanol",
            FuelType::Ammonia => "Ammonia",
            FuelType::Hydrogen => "Hydrogen",
            FuelType::Biofuel => "Biofuel",
        }
    }
}

impl fmt::Display for FuelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for FuelType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FuelType::ALL
            .iter()
            .copied()
            .find(|v| v.as_str() == s.trim())
            .ok_or_else(|| format!("未知燃料类型: {}", s))
    }
}

// ==========================================
// 合规状态 (Compliance Status)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ComplianceStatus {
    Compliant,    // CB >= 0
    NonCompliant, // CB < 0
}

impl ComplianceStatus {
    pub fn from_balance(balance: f64) -> Self {
        if balance >= 0.0 {
            ComplianceStatus::Compliant
        } else {
            ComplianceStatus::NonCompliant
        }
    }
}

impl fmt::Display for ComplianceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ComplianceStatus::Compliant => write!(f, "COMPLIANT"),
            ComplianceStatus::NonCompliant => write!(f, "NON_COMPLIANT"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vessel_type_parse() {
        assert_eq!("BulkCarrier".parse::<VesselType>().unwrap(), VesselType::BulkCarrier);
        assert_eq!(" RoRo ".parse::<VesselType>().unwrap(), VesselType::RoRo);
        assert!("Submarine".parse::<VesselType>().is_err());
    }

    #[test]
    fn test_fuel_type_roundtrip_with_serde_names() {
        for fuel in FuelType::ALL {
            assert_eq!(fuel.as_str().parse::<FuelType>().unwrap(), fuel);
        }
        let json = serde_json::to_string(&FuelType::Lng).unwrap();
        assert_eq!(json, "\"LNG\"");
    }

    #[test]
    fn test_compliance_status_boundary() {
        assert_eq!(ComplianceStatus::from_balance(0.0), ComplianceStatus::Compliant);
        assert_eq!(ComplianceStatus::from_balance(-0.01), ComplianceStatus::NonCompliant);
    }
}
