//! # Solar Geometry
//!
//! Sun position and plane-of-array irradiance for fixed-tilt arrays.

use chrono::{DateTime, Datelike, FixedOffset, Timelike};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

const DEG: f64 = PI / 180.0;

/// Sun position at one instant.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SolarPosition {
    /// Angle above the horizon, degrees
    pub elevation_deg: f64,
    /// Degrees from the zenith
    pub zenith_deg: f64,
    /// Clockwise from north (90 = east, 180 = south), degrees
    pub azimuth_deg: f64,
}

impl SolarPosition {
    pub fn is_up(&self) -> bool {
        self.elevation_deg > 0.0
    }
}

/// Sun position from the local clock time carried by `time` and its UTC offset.
pub fn solar_position(latitude_deg: f64, longitude_deg: f64, time: DateTime<FixedOffset>) -> SolarPosition {
    let day_of_year = time.ordinal() as f64;
    let hour = time.hour() as f64 + time.minute() as f64 / 60.0;
    let timezone_offset = time.offset().local_minus_utc() as f64 / 3600.0;

    // Cooper's declination, ±23.45° over the year
    let declination_rad = 23.45 * DEG * (360.0 / 365.0 * (day_of_year + 284.0) * DEG).sin();
    let latitude_rad = latitude_deg * DEG;

    let solar_time = hour + longitude_deg / 15.0 - timezone_offset;
    let hour_angle_deg = 15.0 * (solar_time - 12.0);
    let hour_angle_rad = hour_angle_deg * DEG;

    let elevation_sin = latitude_rad.sin() * declination_rad.sin()
        + latitude_rad.cos() * declination_rad.cos() * hour_angle_rad.cos();
    let elevation_rad = elevation_sin.clamp(-1.0, 1.0).asin();

    let denom = latitude_rad.cos() * elevation_rad.cos();
    let azimuth_cos = if denom.abs() > 1e-9 {
        ((declination_rad.sin() - latitude_rad.sin() * elevation_rad.sin()) / denom).clamp(-1.0, 1.0)
    } else {
        1.0
    };
    let mut azimuth_deg = azimuth_cos.acos() / DEG;
    // Afternoon sun is in the western sky.
    let afternoon = hour_angle_deg.rem_euclid(360.0);
    if afternoon > 0.0 && afternoon < 180.0 {
        azimuth_deg = 360.0 - azimuth_deg;
    }

    let elevation_deg = elevation_rad / DEG;
    SolarPosition {
        elevation_deg,
        zenith_deg: 90.0 - elevation_deg,
        azimuth_deg,
    }
}

/// Cosine of the angle of incidence on a tilted surface.
pub fn cos_incidence(tilt_deg: f64, surface_azimuth_deg: f64, sun: &SolarPosition) -> f64 {
    let zenith = sun.zenith_deg * DEG;
    let tilt = tilt_deg * DEG;
    zenith.cos() * tilt.cos()
        + zenith.sin() * tilt.sin() * ((sun.azimuth_deg - surface_azimuth_deg) * DEG).cos()
}

/// Plane-of-array irradiance components, W/m².
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PlaneOfArray {
    pub direct: f64,
    pub sky_diffuse: f64,
    pub ground_diffuse: f64,
}

impl PlaneOfArray {
    pub fn global(&self) -> f64 {
        self.direct + self.sky_diffuse + self.ground_diffuse
    }
}

/// Isotropic-sky transposition of horizontal irradiance onto the array plane.
pub fn isotropic_poa(
    tilt_deg: f64,
    surface_azimuth_deg: f64,
    sun: &SolarPosition,
    dni: f64,
    ghi: f64,
    dhi: f64,
    albedo: f64,
) -> PlaneOfArray {
    let tilt_cos = (tilt_deg * DEG).cos();
    let direct = if sun.is_up() {
        (dni * cos_incidence(tilt_deg, surface_azimuth_deg, sun)).max(0.0)
    } else {
        0.0
    };
    PlaneOfArray {
        direct,
        sky_diffuse: (dhi * (1.0 + tilt_cos) / 2.0).max(0.0),
        ground_diffuse: (ghi * albedo * (1.0 - tilt_cos) / 2.0).max(0.0),
    }
}
