use std::collections::BTreeMap;

use anyhow::anyhow;
use chrono::NaiveDate;
use chrono_tz::Tz;
use serde::Deserialize;

use crate::core::time::{DateTime, DateTimeRange, Duration};
use crate::core::timeseries::{DataFrame, DataPoint};
use crate::core::unit::{DegreeCelsius, KiloWattPeak, MetersPerSecond, MillimetersPerHour, Percent, Watt, WattHours};

use super::condition::Condition;

/// Raw forecast response as returned by the provider: a reporting timezone
/// and one record per forecast step.
#[derive(Debug, Deserialize)]
pub struct ForecastResponse {
    pub data_timezone: String,
    pub values: Vec<ForecastRecord>,
}

#[derive(Debug, Deserialize)]
pub struct ForecastRecord {
    pub dtm: String,
    /// Power per installed kWp at this step.
    pub spec_watts: f64,
    #[serde(default)]
    pub temp: Option<f64>,
    #[serde(default)]
    pub precip: Option<f64>,
    #[serde(default, rename = "RH")]
    pub humidity: Option<f64>,
    #[serde(default, rename = "vwind")]
    pub wind_speed: Option<f64>,
    #[serde(default)]
    pub weather_code: Option<u32>,
}

#[derive(Debug, Clone)]
struct WeatherSeries {
    temperature: DataFrame<DegreeCelsius>,
    precipitation: DataFrame<MillimetersPerHour>,
    humidity: DataFrame<Percent>,
    wind_speed: DataFrame<MetersPerSecond>,
    condition_code: DataFrame<u32>,
}

impl WeatherSeries {
    fn empty() -> Self {
        Self {
            temperature: DataFrame::empty(),
            precipitation: DataFrame::empty(),
            humidity: DataFrame::empty(),
            wind_speed: DataFrame::empty(),
            condition_code: DataFrame::empty(),
        }
    }
}

/// One weather forecast step, joined over all weather series.
#[derive(Debug, Clone)]
pub struct WeatherSample {
    pub timestamp: DateTime,
    pub temperature: Option<DegreeCelsius>,
    pub precipitation: Option<MillimetersPerHour>,
    pub humidity: Option<Percent>,
    pub wind_speed: Option<MetersPerSecond>,
    pub condition: Option<Condition>,
}

/// One parsed forecast, immutable once built. Superseded by the next fetch,
/// never mutated. All "now" and day-boundary computations use the
/// provider's reporting timezone.
#[derive(Debug, Clone)]
pub struct Estimate {
    kwp: KiloWattPeak,
    timezone: Tz,
    last_update: DateTime,
    watts: DataFrame<Watt>,
    wh_hours: DataFrame<WattHours>,
    weather: Option<WeatherSeries>,
}

impl Estimate {
    pub fn new(kwp: KiloWattPeak, weather_enabled: bool, response: ForecastResponse) -> anyhow::Result<Self> {
        let timezone = Tz::from_str_insensitive(response.data_timezone.trim())
            .map_err(|e| anyhow!("unknown reporting timezone {:?}: {}", response.data_timezone, e))?;

        let mut watts = DataFrame::empty();
        let mut hourly: BTreeMap<DateTime, Vec<f64>> = BTreeMap::new();
        let mut weather = weather_enabled.then(WeatherSeries::empty);

        for record in &response.values {
            let timestamp = DateTime::from_iso(&record.dtm)?;

            watts.insert(DataPoint::new(Watt(record.spec_watts * kwp.0), timestamp));
            hourly.entry(timestamp.hour_start_in(timezone)).or_default().push(record.spec_watts);

            if let Some(weather) = weather.as_mut() {
                //a reading stamped on the hour boundary covers the bucket ending there
                let shifted = timestamp - Duration::minutes(1);

                if let Some(v) = record.temp {
                    weather.temperature.insert(DataPoint::new(DegreeCelsius(v), shifted));
                }
                if let Some(v) = record.precip {
                    weather.precipitation.insert(DataPoint::new(MillimetersPerHour(v), shifted));
                }
                if let Some(v) = record.humidity {
                    weather.humidity.insert(DataPoint::new(Percent(v), shifted));
                }
                if let Some(v) = record.wind_speed {
                    weather.wind_speed.insert(DataPoint::new(MetersPerSecond(v), shifted));
                }
                if let Some(v) = record.weather_code {
                    weather.condition_code.insert(DataPoint::new(v, shifted));
                }
            }
        }

        let mut wh_hours = DataFrame::empty();
        for (hour, fractions) in hourly {
            let mean = fractions.iter().sum::<f64>() / fractions.len() as f64;
            wh_hours.insert(DataPoint::new(WattHours(mean * kwp.0), hour));
        }

        Ok(Self {
            kwp,
            timezone,
            last_update: DateTime::now(),
            watts,
            wh_hours,
            weather,
        })
    }

    pub fn kwp(&self) -> KiloWattPeak {
        self.kwp
    }

    pub fn timezone(&self) -> Tz {
        self.timezone
    }

    pub fn last_update(&self) -> DateTime {
        self.last_update
    }

    pub fn age(&self) -> Duration {
        self.last_update.elapsed()
    }

    pub fn power_series(&self) -> &DataFrame<Watt> {
        &self.watts
    }

    pub fn energy_series(&self) -> &DataFrame<WattHours> {
        &self.wh_hours
    }

    pub fn energy_today(&self) -> WattHours {
        self.day_production(self.today())
    }

    pub fn energy_tomorrow(&self) -> WattHours {
        self.day_production(self.tomorrow())
    }

    /// Sum of the hourly energy buckets of the given calendar day.
    pub fn day_production(&self, date: NaiveDate) -> WattHours {
        let day = DateTimeRange::calendar_day(date, self.timezone);
        WattHours(self.wh_hours.sum_in(&day))
    }

    /// Energy from now to the end of today. The bucket of the hour in
    /// progress is stamped before "now" and therefore not counted.
    pub fn energy_today_remaining(&self) -> WattHours {
        let now = DateTime::now();
        let today = DateTimeRange::calendar_day(self.today(), self.timezone);
        WattHours(self.wh_hours.sum_in(&DateTimeRange::new(now, *today.end())))
    }

    /// Energy bucket of the clock hour in progress, 0 when the forecast has
    /// no entry for it.
    pub fn energy_current_hour(&self) -> WattHours {
        let hour = DateTime::now().hour_start_in(self.timezone);
        self.wh_hours.at(&hour).map(|dp| dp.value).unwrap_or_default()
    }

    /// Energy over the n full clock hours following the current one.
    pub fn energy_next_hours(&self, hours: i64) -> WattHours {
        let begin = DateTime::now().hour_start_in(self.timezone) + Duration::hours(1);
        WattHours(self.wh_hours.sum_in(&DateTimeRange::window(begin, Duration::hours(hours))))
    }

    pub fn power_now(&self) -> Watt {
        self.power_at(DateTime::now())
    }

    pub fn power_at(&self, at: DateTime) -> Watt {
        self.watts.prev_or_at(at).map(|dp| dp.value).unwrap_or_default()
    }

    /// Instant of the highest forecasted power on the given calendar day.
    /// A day without samples has no peak, which is an error rather than a
    /// zero value.
    pub fn peak_time(&self, date: NaiveDate) -> anyhow::Result<DateTime> {
        let day = DateTimeRange::calendar_day(date, self.timezone);
        self.watts
            .max_in(&day)
            .map(|dp| dp.timestamp)
            .ok_or_else(|| anyhow!("no power samples for {}", date))
    }

    pub fn peak_time_today(&self) -> anyhow::Result<DateTime> {
        self.peak_time(self.today())
    }

    pub fn peak_time_tomorrow(&self) -> anyhow::Result<DateTime> {
        self.peak_time(self.tomorrow())
    }

    pub fn temperature_now(&self) -> Option<DegreeCelsius> {
        self.weather
            .as_ref()
            .and_then(|w| w.temperature.prev_or_at(DateTime::now()))
            .map(|dp| dp.value)
    }

    pub fn precipitation_now(&self) -> Option<MillimetersPerHour> {
        self.weather
            .as_ref()
            .and_then(|w| w.precipitation.prev_or_at(DateTime::now()))
            .map(|dp| dp.value)
    }

    pub fn humidity_now(&self) -> Option<Percent> {
        self.weather
            .as_ref()
            .and_then(|w| w.humidity.prev_or_at(DateTime::now()))
            .map(|dp| dp.value)
    }

    pub fn wind_speed_now(&self) -> Option<MetersPerSecond> {
        self.weather
            .as_ref()
            .and_then(|w| w.wind_speed.prev_or_at(DateTime::now()))
            .map(|dp| dp.value)
    }

    pub fn condition_now(&self) -> Option<Condition> {
        self.weather
            .as_ref()
            .and_then(|w| w.condition_code.prev_or_at(DateTime::now()))
            .and_then(|dp| Condition::from_code(dp.value))
    }

    /// Upcoming weather steps, joined over all weather series. Empty when
    /// the weather feature is off.
    pub fn hourly_weather_forecast(&self) -> Vec<WeatherSample> {
        let Some(weather) = &self.weather else {
            return vec![];
        };

        let now = DateTime::now();
        weather
            .temperature
            .iter()
            .filter(|dp| dp.timestamp >= now)
            .map(|dp| WeatherSample {
                timestamp: dp.timestamp,
                temperature: Some(dp.value),
                precipitation: weather.precipitation.at(&dp.timestamp).map(|d| d.value),
                humidity: weather.humidity.at(&dp.timestamp).map(|d| d.value),
                wind_speed: weather.wind_speed.at(&dp.timestamp).map(|d| d.value),
                condition: weather
                    .condition_code
                    .at(&dp.timestamp)
                    .and_then(|d| Condition::from_code(d.value)),
            })
            .collect()
    }

    fn today(&self) -> NaiveDate {
        DateTime::now().date_in(self.timezone)
    }

    fn tomorrow(&self) -> NaiveDate {
        //failing only at the edges of what can be stored in a date
        self.today().succ_opt().unwrap()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::time::FIXED_NOW;
    use serde_json::json;

    fn response(timezone: &str, values: serde_json::Value) -> ForecastResponse {
        serde_json::from_value(json!({
            "data_timezone": timezone,
            "values": values,
        }))
        .unwrap()
    }

    fn dt(iso: &str) -> DateTime {
        DateTime::from_iso(iso).unwrap()
    }

    async fn at<F: Future>(now: &str, f: F) -> F::Output {
        FIXED_NOW.scope(dt(now), f).await
    }

    #[tokio::test]
    async fn test_hourly_energy_is_mean_of_fractions_times_capacity() {
        let response = response(
            "UTC",
            json!([
                {"dtm": "2025-06-10T10:00:00Z", "spec_watts": 0.2},
                {"dtm": "2025-06-10T10:15:00Z", "spec_watts": 0.4},
            ]),
        );

        let estimate = Estimate::new(KiloWattPeak(4.0), false, response).unwrap();

        let bucket = estimate.energy_series().at(&dt("2025-06-10T10:00:00Z")).unwrap();
        assert_eq!(bucket.value, WattHours(1.2));
    }

    #[tokio::test]
    async fn test_power_series_scaled_by_capacity() {
        let response = response(
            "UTC",
            json!([
                {"dtm": "2025-06-10T10:00:00Z", "spec_watts": 150.0},
            ]),
        );

        let estimate = Estimate::new(KiloWattPeak(2.0), false, response).unwrap();

        at("2025-06-10T10:05:00Z", async {
            assert_eq!(estimate.power_now(), Watt(300.0));
        })
        .await;
    }

    #[tokio::test]
    async fn test_power_before_first_sample_is_zero() {
        let response = response(
            "UTC",
            json!([
                {"dtm": "2025-06-10T10:00:00Z", "spec_watts": 150.0},
            ]),
        );

        let estimate = Estimate::new(KiloWattPeak(2.0), false, response).unwrap();

        at("2025-06-10T04:00:00Z", async {
            assert_eq!(estimate.power_now(), Watt(0.0));
        })
        .await;
    }

    #[tokio::test]
    async fn test_energy_today_uses_reporting_timezone_day_boundary() {
        //23:30 UTC is already the next day in Berlin
        let response = response(
            "Europe/Berlin",
            json!([
                {"dtm": "2025-06-10T23:30:00Z", "spec_watts": 1.0},
            ]),
        );

        let estimate = Estimate::new(KiloWattPeak(1.0), false, response).unwrap();

        at("2025-06-11T08:00:00+02:00", async {
            assert_eq!(estimate.energy_today(), WattHours(1.0));
            assert_eq!(estimate.energy_tomorrow(), WattHours(0.0));
        })
        .await;

        at("2025-06-10T18:00:00Z", async {
            //in Berlin the sample is tomorrow
            assert_eq!(estimate.energy_today(), WattHours(0.0));
            assert_eq!(estimate.energy_tomorrow(), WattHours(1.0));
        })
        .await;
    }

    #[tokio::test]
    async fn test_day_production_sums_all_buckets_of_the_day() {
        let response = response(
            "UTC",
            json!([
                {"dtm": "2025-06-10T09:00:00Z", "spec_watts": 1.0},
                {"dtm": "2025-06-10T10:00:00Z", "spec_watts": 2.0},
                {"dtm": "2025-06-10T11:00:00Z", "spec_watts": 3.0},
                {"dtm": "2025-06-11T09:00:00Z", "spec_watts": 7.0},
            ]),
        );

        let estimate = Estimate::new(KiloWattPeak(1.0), false, response).unwrap();

        at("2025-06-10T12:00:00Z", async {
            assert_eq!(estimate.energy_today(), WattHours(6.0));
            assert_eq!(estimate.energy_tomorrow(), WattHours(7.0));
        })
        .await;
    }

    #[tokio::test]
    async fn test_energy_today_remaining_skips_hour_in_progress() {
        let response = response(
            "UTC",
            json!([
                {"dtm": "2025-06-10T09:00:00Z", "spec_watts": 1.0},
                {"dtm": "2025-06-10T10:00:00Z", "spec_watts": 2.0},
                {"dtm": "2025-06-10T11:00:00Z", "spec_watts": 3.0},
                {"dtm": "2025-06-10T12:00:00Z", "spec_watts": 4.0},
            ]),
        );

        let estimate = Estimate::new(KiloWattPeak(1.0), false, response).unwrap();

        at("2025-06-10T10:30:00Z", async {
            //bucket 10:00 is in progress, buckets 11:00 and 12:00 remain
            assert_eq!(estimate.energy_today_remaining(), WattHours(7.0));
        })
        .await;
    }

    #[tokio::test]
    async fn test_energy_current_hour_exact_bucket_or_zero() {
        let response = response(
            "UTC",
            json!([
                {"dtm": "2025-06-10T10:00:00Z", "spec_watts": 2.0},
            ]),
        );

        let estimate = Estimate::new(KiloWattPeak(1.0), false, response).unwrap();

        at("2025-06-10T10:45:00Z", async {
            assert_eq!(estimate.energy_current_hour(), WattHours(2.0));
        })
        .await;

        at("2025-06-10T12:45:00Z", async {
            //no bucket for 12:00, not a carry-over of the last known one
            assert_eq!(estimate.energy_current_hour(), WattHours(0.0));
        })
        .await;
    }

    #[tokio::test]
    async fn test_energy_next_hours_window_starts_after_current_hour() {
        let response = response(
            "UTC",
            json!([
                {"dtm": "2025-06-10T10:00:00Z", "spec_watts": 100.0},
                {"dtm": "2025-06-10T11:00:00Z", "spec_watts": 200.0},
                {"dtm": "2025-06-10T12:00:00Z", "spec_watts": 300.0},
                {"dtm": "2025-06-10T13:00:00Z", "spec_watts": 400.0},
            ]),
        );

        let estimate = Estimate::new(KiloWattPeak(1.0), false, response).unwrap();

        at("2025-06-10T10:30:00Z", async {
            assert_eq!(estimate.energy_next_hours(2), WattHours(500.0));
        })
        .await;
    }

    #[tokio::test]
    async fn test_peak_time_picks_maximum_sample() {
        let response = response(
            "UTC",
            json!([
                {"dtm": "2025-06-10T10:00:00Z", "spec_watts": 1.0},
                {"dtm": "2025-06-10T11:00:00Z", "spec_watts": 5.0},
                {"dtm": "2025-06-10T12:00:00Z", "spec_watts": 3.0},
            ]),
        );

        let estimate = Estimate::new(KiloWattPeak(1.0), false, response).unwrap();

        let date = NaiveDate::from_ymd_opt(2025, 6, 10).unwrap();
        assert_eq!(estimate.peak_time(date).unwrap(), dt("2025-06-10T11:00:00Z"));
    }

    #[tokio::test]
    async fn test_peak_time_without_samples_is_an_error() {
        let response = response(
            "UTC",
            json!([
                {"dtm": "2025-06-10T10:00:00Z", "spec_watts": 1.0},
            ]),
        );

        let estimate = Estimate::new(KiloWattPeak(1.0), false, response).unwrap();

        let date = NaiveDate::from_ymd_opt(2025, 6, 12).unwrap();
        assert!(estimate.peak_time(date).is_err());
    }

    #[tokio::test]
    async fn test_weather_disabled_ignores_weather_fields() {
        let response = response(
            "UTC",
            json!([
                {"dtm": "2025-06-10T10:00:00Z", "spec_watts": 1.0,
                 "temp": 21.5, "precip": 0.0, "RH": 55.0, "vwind": 3.2, "weather_code": 0},
            ]),
        );

        let estimate = Estimate::new(KiloWattPeak(1.0), false, response).unwrap();

        at("2025-06-10T10:30:00Z", async {
            assert_eq!(estimate.temperature_now(), None);
            assert_eq!(estimate.humidity_now(), None);
            assert_eq!(estimate.condition_now(), None);
            assert!(estimate.hourly_weather_forecast().is_empty());
        })
        .await;
    }

    #[tokio::test]
    async fn test_weather_series_shifted_back_one_minute() {
        let response = response(
            "UTC",
            json!([
                {"dtm": "2025-06-10T11:00:00Z", "spec_watts": 1.0, "temp": 18.0},
            ]),
        );

        let estimate = Estimate::new(KiloWattPeak(1.0), true, response).unwrap();

        at("2025-06-10T10:59:30Z", async {
            //the 11:00 reading covers the bucket ending at 11:00
            assert_eq!(estimate.temperature_now(), Some(DegreeCelsius(18.0)));
        })
        .await;

        at("2025-06-10T10:58:00Z", async {
            assert_eq!(estimate.temperature_now(), None);
        })
        .await;
    }

    #[tokio::test]
    async fn test_condition_now_maps_weather_code() {
        let response = response(
            "UTC",
            json!([
                {"dtm": "2025-06-10T10:00:00Z", "spec_watts": 1.0, "weather_code": 61},
            ]),
        );

        let estimate = Estimate::new(KiloWattPeak(1.0), true, response).unwrap();

        at("2025-06-10T10:30:00Z", async {
            assert_eq!(estimate.condition_now(), Some(Condition::Rainy));
        })
        .await;
    }

    #[tokio::test]
    async fn test_hourly_weather_forecast_is_future_only() {
        let response = response(
            "UTC",
            json!([
                {"dtm": "2025-06-10T10:00:00Z", "spec_watts": 1.0,
                 "temp": 16.0, "RH": 70.0, "vwind": 2.0, "precip": 0.1, "weather_code": 3},
                {"dtm": "2025-06-10T11:00:00Z", "spec_watts": 1.0,
                 "temp": 17.0, "RH": 65.0, "vwind": 2.5, "precip": 0.0, "weather_code": 1},
                {"dtm": "2025-06-10T12:00:00Z", "spec_watts": 1.0,
                 "temp": 18.0, "RH": 60.0, "vwind": 3.0, "precip": 0.0, "weather_code": 0},
            ]),
        );

        let estimate = Estimate::new(KiloWattPeak(1.0), true, response).unwrap();

        at("2025-06-10T10:30:00Z", async {
            let forecast = estimate.hourly_weather_forecast();

            assert_eq!(forecast.len(), 2);
            assert_eq!(forecast[0].temperature, Some(DegreeCelsius(17.0)));
            assert_eq!(forecast[0].humidity, Some(Percent(65.0)));
            assert_eq!(forecast[0].wind_speed, Some(MetersPerSecond(2.5)));
            assert_eq!(forecast[0].condition, Some(Condition::PartlyCloudy));
            assert_eq!(forecast[1].condition, Some(Condition::Sunny));
        })
        .await;
    }

    #[tokio::test]
    async fn test_timezone_parsed_case_insensitively() {
        let response = response("europe/berlin", json!([]));

        let estimate = Estimate::new(KiloWattPeak(1.0), false, response).unwrap();

        assert_eq!(estimate.timezone(), chrono_tz::Europe::Berlin);
    }

    #[tokio::test]
    async fn test_unknown_timezone_is_an_error() {
        let response = response("Mars/Olympus_Mons", json!([]));

        assert!(Estimate::new(KiloWattPeak(1.0), false, response).is_err());
    }
}
