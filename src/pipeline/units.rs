use crate::types::filter::UnitSystem;

pub const METERS_PER_KM: f64 = 1000.0;
pub const METERS_PER_MILE: f64 = 1609.344;
pub const FEET_PER_METER: f64 = 3.280_84;

impl UnitSystem {
    pub fn distance_label(self) -> &'static str {
        match self {
            UnitSystem::Metric => "km",
            UnitSystem::Imperial => "mi",
        }
    }

    pub fn speed_label(self) -> &'static str {
        match self {
            UnitSystem::Metric => "km/h",
            UnitSystem::Imperial => "mph",
        }
    }

    pub fn elevation_label(self) -> &'static str {
        match self {
            UnitSystem::Metric => "m",
            UnitSystem::Imperial => "ft",
        }
    }

    fn meters_per_unit(self) -> f64 {
        match self {
            UnitSystem::Metric => METERS_PER_KM,
            UnitSystem::Imperial => METERS_PER_MILE,
        }
    }

    /// Metres to km or miles.
    pub fn distance(self, meters: f64) -> f64 {
        meters / self.meters_per_unit()
    }

    pub fn distance_to_meters(self, value: f64) -> f64 {
        value * self.meters_per_unit()
    }

    /// Seconds per kilometre to seconds per km or mile.
    pub fn pace(self, s_per_km: f64) -> f64 {
        s_per_km * self.meters_per_unit() / METERS_PER_KM
    }

    pub fn pace_to_s_per_km(self, value: f64) -> f64 {
        value * METERS_PER_KM / self.meters_per_unit()
    }

    /// Metres per second to km/h or mph.
    pub fn speed(self, m_per_s: f64) -> f64 {
        m_per_s * 3600.0 / self.meters_per_unit()
    }

    pub fn speed_to_m_per_s(self, value: f64) -> f64 {
        value * self.meters_per_unit() / 3600.0
    }

    pub fn elevation(self, meters: f64) -> f64 {
        match self {
            UnitSystem::Metric => meters,
            UnitSystem::Imperial => meters * FEET_PER_METER,
        }
    }
}

/// Renders a pace in seconds as `m:ss`.
pub fn format_pace(seconds: Option<f64>) -> String {
    match seconds {
        Some(s) if s.is_finite() && s >= 0.0 => {
            let total = s.round() as u64;
            format!("{}:{:02}", total / 60, total % 60)
        }
        _ => "--:--".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn distance_round_trips_through_miles() {
        let meters = 21_097.5;
        let miles = UnitSystem::Imperial.distance(meters);
        assert_relative_eq!(miles, 13.109, epsilon = 1e-3);
        assert_relative_eq!(UnitSystem::Imperial.distance_to_meters(miles), meters, epsilon = 1e-9);
    }

    #[test]
    fn pace_and_speed_round_trip() {
        for unit in [UnitSystem::Metric, UnitSystem::Imperial] {
            assert_relative_eq!(unit.pace_to_s_per_km(unit.pace(287.0)), 287.0, epsilon = 1e-9);
            assert_relative_eq!(unit.speed_to_m_per_s(unit.speed(8.3)), 8.3, epsilon = 1e-9);
        }
    }

    #[test]
    fn labels_follow_unit_system() {
        assert_eq!(UnitSystem::Metric.elevation_label(), "m");
        assert_eq!(UnitSystem::Imperial.elevation_label(), "ft");
        assert_eq!(UnitSystem::Imperial.speed_label(), "mph");
    }

    #[test]
    fn imperial_pace_is_per_mile() {
        assert_relative_eq!(UnitSystem::Imperial.pace(300.0), 482.8032, epsilon = 1e-6);
        assert_relative_eq!(UnitSystem::Metric.speed(10.0), 36.0, epsilon = 1e-9);
    }

    #[test]
    fn formats_pace() {
        assert_eq!(format_pace(Some(270.0)), "4:30");
        assert_eq!(format_pace(Some(299.6)), "5:00");
        assert_eq!(format_pace(None), "--:--");
    }
}
