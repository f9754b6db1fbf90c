use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::{read_json, round_half_up, FetchError};

#[derive(Debug, Deserialize)]
struct MainReadings {
    temp: f64,
    feels_like: f64,
    humidity: u32,
}

#[derive(Debug, Deserialize)]
struct Condition {
    description: String,
    icon: String,
}

#[derive(Debug, Deserialize)]
struct Wind {
    speed: f64,
}

/// OpenWeather `/data/2.5/weather` response, only the fields we use
#[derive(Debug, Deserialize)]
struct CurrentWeather {
    main: MainReadings,
    weather: Vec<Condition>,
    wind: Wind,
}

/// Current conditions in metric units, wind in km/h
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Weather {
    pub temp: i64,
    pub feels_like: i64,
    pub description: String,
    pub icon: String,
    pub humidity: u32,
    pub wind_speed: i64,
}

impl TryFrom<CurrentWeather> for Weather {
    type Error = FetchError;

    fn try_from(data: CurrentWeather) -> Result<Self, Self::Error> {
        let condition = data
            .weather
            .into_iter()
            .next()
            .ok_or_else(|| FetchError::Decode("weather list is empty".to_string()))?;

        Ok(Weather {
            temp: round_half_up(data.main.temp),
            feels_like: round_half_up(data.main.feels_like),
            description: condition.description,
            icon: condition.icon,
            humidity: data.main.humidity,
            // m/s to km/h
            wind_speed: round_half_up(data.wind.speed * 3.6),
        })
    }
}

pub async fn current_weather(
    http: &Client,
    base: &str,
    api_key: &str,
    city: &str,
) -> Result<Weather, FetchError> {
    let url = format!("{}/data/2.5/weather", base);

    let response = http
        .get(&url)
        .query(&[("q", city), ("appid", api_key), ("units", "metric")])
        .send()
        .await?;

    let data: CurrentWeather = read_json(response).await?;
    Weather::try_from(data)
}
