//! Weather collaborator contract tests against a mock OpenWeatherMap.

use jarvis::config::WeatherConfig;
use jarvis::weather::{FETCH_FAILED, OpenWeatherClient, WeatherProvider, unknown_city};
use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client(server: &MockServer) -> OpenWeatherClient {
    let config = WeatherConfig {
        api_url: format!("{}/data/2.5/weather", server.uri()),
        timeout_secs: 5,
        ..WeatherConfig::default()
    };
    OpenWeatherClient::new(&config, Some("weather-key".to_owned()))
}

#[tokio::test]
async fn conditions_are_composed_into_a_sentence() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/data/2.5/weather"))
        .and(query_param("q", "new york"))
        .and(query_param("appid", "weather-key"))
        .and(query_param("units", "metric"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "cod": 200,
            "name": "New York",
            "weather": [{"main": "Clouds", "description": "broken clouds"}],
            "main": {"temp": 18.4, "humidity": 62},
            "wind": {"speed": 4.6}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let sentence = client(&server).describe("new york").await;
    assert_eq!(
        sentence,
        "The weather in new york is Broken clouds with 18.4 degrees Celsius, humidity at 62 \
         percent, and wind speed of 4.6 meters per second."
    );
}

#[tokio::test]
async fn unknown_city_gets_the_fixed_sentence() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/data/2.5/weather"))
        .respond_with(
            ResponseTemplate::new(404)
                .set_body_json(json!({"cod": "404", "message": "city not found"})),
        )
        .mount(&server)
        .await;

    assert_eq!(client(&server).describe("atlantis").await, unknown_city("atlantis"));
}

#[tokio::test]
async fn garbage_response_is_a_fetch_failure() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/data/2.5/weather"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    assert_eq!(client(&server).describe("mumbai").await, FETCH_FAILED);
}

#[tokio::test]
async fn unreachable_service_is_a_fetch_failure() {
    let config = WeatherConfig {
        api_url: "http://127.0.0.1:9/data/2.5/weather".to_owned(),
        timeout_secs: 2,
        ..WeatherConfig::default()
    };
    let client = OpenWeatherClient::new(&config, None);
    assert_eq!(client.describe("mumbai").await, FETCH_FAILED);
}
