//! Plain-text reports for the console.

use crate::federated::NetworkMetrics;
use crate::sensor::Sensor;

/// Health panel.
pub fn format_network_health(metrics: &NetworkMetrics) -> String {
    let health = &metrics.network_health;
    format!(
        "Network Health Metrics\n\
         \n  Average Accuracy: {:.2}%\
         \n  Average Privacy: {:.1}%\
         \n  Active Sensors: {}\
         \n  Pattern Coverage: {:.1}%",
        health.average_accuracy * 100.0,
        health.average_privacy,
        health.active_sensors,
        health.pattern_coverage * 100.0,
    )
}

/// Per-sensor pattern table; sensors without patterns are skipped.
pub fn format_sensor_analysis(sensors: &[Sensor]) -> String {
    let mut out = String::from("Detailed Pattern Analysis\n");

    for sensor in sensors {
        let Some(patterns) = sensor.learned_patterns() else {
            continue;
        };
        let (low, high) = patterns.daily_range;
        out.push_str(&format!(
            "  {:<20} range {:.2}..{:.2}  variance {:.2}  trend {:+.3}  peaks {:?}  privacy {:.1}%  accuracy {:.2}%\n",
            sensor.name(),
            low,
            high,
            patterns.variance,
            patterns.trend,
            patterns.peak_hours,
            sensor.privacy().score(),
            sensor.accuracy() * 100.0,
        ));
    }

    out
}

/// Progress line.
pub fn format_progress(hour: u32, total_hours: u32) -> String {
    let fraction = if total_hours == 0 {
        1.0
    } else {
        hour as f64 / total_hours as f64
    };
    format!("Hour {}/{} ({:.1}% complete)", hour, total_hours, fraction * 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{NoiseConfig, SimulationConfig};
    use crate::federated::Network;
    use crate::visualization::NullSink;

    fn network(hours: u32) -> Network<NullSink> {
        let config = SimulationConfig::default()
            .with_seed(2)
            .with_noise(NoiseConfig::disabled());
        let mut network = Network::from_config(&config, NullSink).unwrap();
        network.run_simulation(hours).unwrap();
        network
    }

    #[test]
    fn test_format_network_health() {
        let text = format_network_health(&network(30).get_network_metrics());
        assert!(text.contains("Active Sensors: 3"));
        assert!(text.contains("Pattern Coverage: 100.0%"));
        assert!(text.contains("Average Accuracy: 50.00%"));
    }

    #[test]
    fn test_format_sensor_analysis() {
        let early = format_sensor_analysis(network(5).sensors());
        assert_eq!(early.lines().count(), 1);

        let late = format_sensor_analysis(network(30).sensors());
        assert_eq!(late.lines().count(), 4);
        assert!(late.contains("Office Building"));
        assert!(late.ends_with("%\n"));
    }

    #[test]
    fn test_format_progress() {
        assert_eq!(format_progress(25, 100), "Hour 25/100 (25.0% complete)");
        assert_eq!(format_progress(0, 0), "Hour 0/0 (100.0% complete)");
    }
}
