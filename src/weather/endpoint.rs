//! Longitude-band routing to NSRDB datasets.

use crate::domain::WeatherDataset;

/// Pick the NSRDB dataset covering `longitude`.
///
/// `(-16, 91)` is Meteosat IODC, `[91, 182)` is Himawari and everything else,
/// including out-of-range longitudes, goes to the PSM3 Americas dataset.
pub fn dataset_for_longitude(longitude: f64) -> WeatherDataset {
    if longitude > -16.0 && longitude < 91.0 {
        WeatherDataset::MsgIodc
    } else if (91.0..182.0).contains(&longitude) {
        WeatherDataset::Himawari
    } else {
        WeatherDataset::Psm3
    }
}

/// Download path of a dataset below the API base URL.
pub fn download_path(dataset: WeatherDataset) -> &'static str {
    match dataset {
        WeatherDataset::Psm3 => "/api/nsrdb/v2/solar/psm3-download.csv",
        WeatherDataset::MsgIodc => "/api/nsrdb/v2/solar/msg-iodc-download.csv",
        WeatherDataset::Himawari => "/api/nsrdb/v2/solar/himawari-download.csv",
    }
}
