//! Static reference data seeded into the database on first start.

use crate::models::{Alert, AlertSeverity, Hotspot, RiskLevel, SensitiveArea, SensitiveAreaType};

pub struct SeedWard {
    pub ward_no: i64,
    pub name: &'static str,
    pub readiness: i64,
    pub pumps: i64,
    pub personnel: i64,
    pub vehicles: i64,
    pub hotspots: i64,
    pub last_maintenance: &'static str,
    pub coords: [f64; 2],
    pub boundary: &'static [[f64; 2]],
}

const ROHINI_BOUNDARY: &[[f64; 2]] = &[
    [28.7650, 77.0650],
    [28.7680, 77.0850],
    [28.7700, 77.1050],
    [28.7550, 77.1200],
    [28.7350, 77.1250],
    [28.7100, 77.1150],
    [28.6950, 77.1050],
    [28.6900, 77.0850],
    [28.7000, 77.0700],
    [28.7200, 77.0650],
    [28.7400, 77.0600],
    [28.7650, 77.0650],
];

pub const WARDS: &[SeedWard] = &[
    SeedWard {
        ward_no: 8,
        name: "Rohini",
        readiness: 65,
        pumps: 6,
        personnel: 25,
        vehicles: 4,
        hotspots: 8,
        last_maintenance: "2024-04-15",
        coords: [28.7250, 77.1000],
        boundary: ROHINI_BOUNDARY,
    },
    SeedWard {
        ward_no: 12,
        name: "Dwarka",
        readiness: 72,
        pumps: 8,
        personnel: 30,
        vehicles: 5,
        hotspots: 6,
        last_maintenance: "2024-05-10",
        coords: [28.5921, 77.0460],
        boundary: &[
            [28.6200, 77.0200],
            [28.6250, 77.0600],
            [28.6000, 77.0700],
            [28.5700, 77.0500],
            [28.5650, 77.0200],
            [28.6200, 77.0200],
        ],
    },
    SeedWard {
        ward_no: 45,
        name: "Karol Bagh",
        readiness: 55,
        pumps: 4,
        personnel: 20,
        vehicles: 3,
        hotspots: 12,
        last_maintenance: "2024-03-20",
        coords: [28.6519, 77.1895],
        boundary: &[
            [28.6700, 77.1700],
            [28.6750, 77.2050],
            [28.6400, 77.2100],
            [28.6300, 77.1800],
            [28.6700, 77.1700],
        ],
    },
    SeedWard {
        ward_no: 78,
        name: "Shahdara",
        readiness: 48,
        pumps: 5,
        personnel: 22,
        vehicles: 3,
        hotspots: 15,
        last_maintenance: "2024-02-28",
        coords: [28.6833, 77.2833],
        boundary: &[
            [28.7000, 77.2650],
            [28.7050, 77.3000],
            [28.6700, 77.3050],
            [28.6600, 77.2700],
            [28.7000, 77.2650],
        ],
    },
    SeedWard {
        ward_no: 23,
        name: "Najafgarh",
        readiness: 68,
        pumps: 7,
        personnel: 28,
        vehicles: 4,
        hotspots: 9,
        last_maintenance: "2024-04-25",
        coords: [28.6092, 76.9798],
        boundary: &[
            [28.6300, 76.9600],
            [28.6350, 76.9950],
            [28.6000, 77.0000],
            [28.5850, 76.9650],
            [28.6300, 76.9600],
        ],
    },
    SeedWard {
        ward_no: 56,
        name: "Janakpuri",
        readiness: 70,
        pumps: 6,
        personnel: 26,
        vehicles: 4,
        hotspots: 7,
        last_maintenance: "2024-05-01",
        coords: [28.6219, 77.0831],
        boundary: &[
            [28.6400, 77.0650],
            [28.6450, 77.1000],
            [28.6100, 77.1050],
            [28.6050, 77.0700],
            [28.6400, 77.0650],
        ],
    },
    SeedWard {
        ward_no: 34,
        name: "Vasant Vihar",
        readiness: 78,
        pumps: 9,
        personnel: 32,
        vehicles: 6,
        hotspots: 4,
        last_maintenance: "2024-05-15",
        coords: [28.5540, 77.1597],
        boundary: &[
            [28.5700, 77.1400],
            [28.5750, 77.1750],
            [28.5400, 77.1800],
            [28.5350, 77.1450],
            [28.5700, 77.1400],
        ],
    },
    SeedWard {
        ward_no: 89,
        name: "Mayur Vihar",
        readiness: 52,
        pumps: 5,
        personnel: 21,
        vehicles: 3,
        hotspots: 11,
        last_maintenance: "2024-03-10",
        coords: [28.6082, 77.2892],
        boundary: &[
            [28.6250, 77.2700],
            [28.6300, 77.3050],
            [28.5950, 77.3100],
            [28.5900, 77.2750],
            [28.6250, 77.2700],
        ],
    },
];

/// Boundary polygon of a seeded ward.
#[cfg(test)]
pub fn ward_boundary(ward_no: i64) -> Option<&'static [[f64; 2]]> {
    WARDS
        .iter()
        .find(|w| w.ward_no == ward_no)
        .map(|w| w.boundary)
}

pub fn hotspots() -> Vec<Hotspot> {
    let rows: [(&str, &str, [f64; 2], RiskLevel, &str, &str, &str, &str); 8] = [
        ("1", "Rohini Sector 3 Market", [28.7041, 77.1025], RiskLevel::High, "2024-08-01", "3 feet", "4 hours", "Main market area with drainage issues during heavy rainfall"),
        ("2", "Rohini Sector 7 Extension", [28.7128, 77.1134], RiskLevel::High, "2024-07-28", "3.5 feet", "5 hours", "Low-lying residential area prone to waterlogging"),
        ("3", "Rohini Sector 11 Metro Station", [28.7189, 77.1089], RiskLevel::Medium, "2024-07-22", "2 feet", "3 hours", "Metro station underpass waterlogging"),
        ("4", "Rohini Sector 16 Main Road", [28.7312, 77.1145], RiskLevel::Medium, "2024-08-05", "2.5 feet", "3 hours", "Main road connecting sectors with poor drainage"),
        ("5", "Rohini Sector 24 Community Center", [28.7423, 77.0989], RiskLevel::Low, "2024-07-15", "1.5 feet", "2 hours", "Community center parking area waterlogging"),
        ("6", "Rohini Sector 18 Park", [28.7298, 77.0867], RiskLevel::Medium, "2024-08-10", "2 feet", "2.5 hours", "Park and surrounding residential roads"),
        ("7", "Rohini Sector 9 DDA Flats", [28.7156, 77.1178], RiskLevel::High, "2024-08-12", "3 feet", "4 hours", "DDA housing complex with recurring flood issues"),
        ("8", "Rohini Sector 22 Industrial Area", [28.7389, 77.1056], RiskLevel::Medium, "2024-07-25", "2 feet", "3 hours", "Industrial units facing waterlogging problems"),
    ];

    rows.into_iter()
        .map(
            |(id, name, coords, risk, last_flooded, depth, duration, description)| Hotspot {
                id: id.to_string(),
                name: name.to_string(),
                coords,
                risk,
                last_flooded: last_flooded.to_string(),
                depth: depth.to_string(),
                duration: duration.to_string(),
                description: Some(description.to_string()),
                ward_no: 8,
            },
        )
        .collect()
}

pub fn sensitive_areas() -> Vec<SensitiveArea> {
    use SensitiveAreaType::*;

    let rows: [(&str, SensitiveAreaType, &str, f64, f64, &str, i64); 8] = [
        ("sa_rohini_h1", Hospital, "Dr. Baba Saheb Ambedkar Hospital", 28.7160, 77.1130, "Rohini", 8),
        ("sa_rohini_h2", Hospital, "Saroj Super Speciality Hospital", 28.7265, 77.0840, "Rohini", 8),
        ("sa_rohini_s1", School, "Bal Bharati Public School, Sector 14", 28.7352, 77.1133, "Rohini", 8),
        ("sa_rohini_s2", School, "Government Sarvodaya Vidyalaya, Sector 8", 28.7110, 77.1120, "Rohini", 8),
        ("sa_rohini_m1", Metro, "Rohini West Metro Station", 28.7147, 77.1152, "Rohini", 8),
        ("sa_rohini_m2", Metro, "Rithala Metro Station", 28.7209, 77.1070, "Rohini", 8),
        ("sa_rohini_m3", Metro, "Rohini East Metro Station", 28.7250, 77.1180, "Rohini", 8),
        ("sa_dwarka_m1", Metro, "Dwarka Sector 10 Metro Station", 28.5810, 77.0570, "Dwarka", 12),
    ];

    rows.into_iter()
        .map(|(id, area_type, name, latitude, longitude, ward, ward_no)| SensitiveArea {
            id: id.to_string(),
            area_type,
            name: name.to_string(),
            latitude,
            longitude,
            ward: ward.to_string(),
            ward_no,
        })
        .collect()
}

pub fn alerts() -> Vec<Alert> {
    use AlertSeverity::*;

    let rows: [(&str, AlertSeverity, &str, &str, i64, &str, &str, bool); 12] = [
        ("1", Critical, "Rohini Sector 9 DDA Flats", "Rohini", 8, "Water level rising rapidly - 3 feet and increasing", "2024-08-15T14:30:00", false),
        ("2", High, "Rohini Sector 7 Extension", "Rohini", 8, "Waterlogging reported in residential area, pumps deployed", "2024-08-15T13:45:00", false),
        ("3", Medium, "Rohini Sector 11 Metro Station", "Rohini", 8, "Minor waterlogging at metro station underpass", "2024-08-15T12:00:00", true),
        ("4", High, "Rohini Sector 3 Market", "Rohini", 8, "Market area experiencing severe waterlogging, traffic diverted", "2024-08-15T10:15:00", false),
        ("5", Low, "Rohini Sector 24 Community Center", "Rohini", 8, "Drainage cleared, situation normalizing", "2024-08-15T09:00:00", true),
        ("6", Critical, "Shahdara Main Road", "Shahdara", 78, "Severe waterlogging blocking major intersection", "2024-08-15T14:15:00", false),
        ("7", High, "Karol Bagh Metro", "Karol Bagh", 45, "Metro station entrance flooded, services disrupted", "2024-08-15T13:30:00", false),
        ("8", Medium, "Dwarka Sector 10", "Dwarka", 12, "Residential area experiencing minor waterlogging", "2024-08-15T12:45:00", false),
        ("9", Critical, "Mayur Vihar Phase 2", "Mayur Vihar", 89, "Drainage system failure, water entering homes", "2024-08-15T11:20:00", false),
        ("10", Low, "Vasant Vihar Colony", "Vasant Vihar", 34, "Minor puddles, clearing in progress", "2024-08-15T10:00:00", true),
        ("11", Medium, "Najafgarh Village", "Najafgarh", 23, "Agricultural area waterlogging, monitoring situation", "2024-08-15T09:30:00", false),
        ("12", High, "Janakpuri District Centre", "Janakpuri", 56, "Shopping complex parking flooded", "2024-08-15T08:45:00", false),
    ];

    rows.into_iter()
        .map(
            |(id, severity, location, ward, ward_no, message, timestamp, is_read)| Alert {
                id: id.to_string(),
                severity,
                location: location.to_string(),
                ward: Some(ward.to_string()),
                ward_no: Some(ward_no),
                message: message.to_string(),
                timestamp: timestamp.to_string(),
                is_read,
            },
        )
        .collect()
}
