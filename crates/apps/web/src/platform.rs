//! Browser implementations of the dashboard's transport, clock, location and
//! timer seams.

use api::{ApiError, HttpClient, HttpRequest, HttpResponse, Method, RequestBody};
use chrono::{DateTime, FixedOffset, Offset, Utc};
use dashboard::{Clock, GeoError, Geolocator};
use foundation::LatLng;
use futures_util::future::LocalBoxFuture;
use gloo_net::http::Request;
use gloo_timers::callback::Interval;
use gloo_timers::future::TimeoutFuture;
use runtime::Disposable;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;

#[wasm_bindgen(inline_js = r#"
export function currentPosition() {
    return new Promise((resolve, reject) => {
        if (!navigator.geolocation) {
            reject('unsupported');
            return;
        }
        navigator.geolocation.getCurrentPosition(
            (pos) => resolve({ lat: pos.coords.latitude, lng: pos.coords.longitude }),
            (err) => reject(err.message || 'denied'),
            { enableHighAccuracy: true, timeout: 10000, maximumAge: 60000 }
        );
    });
}
"#)]
extern "C" {
    #[wasm_bindgen(js_name = currentPosition)]
    fn current_position() -> js_sys::Promise;
}

/// `fetch` through gloo-net; cookies ride along on same-origin requests.
#[derive(Debug, Default, Clone, Copy)]
pub struct GlooHttp;

fn network(e: impl std::fmt::Display) -> ApiError {
    ApiError::Network(e.to_string())
}

impl HttpClient for GlooHttp {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, ApiError> {
        let mut builder = match request.method {
            Method::Get => Request::get(&request.url),
            Method::Post => Request::post(&request.url),
        };
        for (name, value) in &request.headers {
            builder = builder.header(name, value);
        }
        let resp = match &request.body {
            RequestBody::Empty => builder.send().await,
            RequestBody::Json(body) => builder.json(body).map_err(network)?.send().await,
        }
        .map_err(network)?;
        let status = resp.status();
        let body = resp.text().await.map_err(network)?;
        Ok(HttpResponse::new(status, body))
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct BrowserClock;

impl Clock for BrowserClock {
    fn now(&self) -> DateTime<Utc> {
        DateTime::from_timestamp_millis(js_sys::Date::now() as i64).unwrap_or_default()
    }

    fn random(&self) -> f64 {
        js_sys::Math::random()
    }

    fn local_offset(&self) -> FixedOffset {
        // getTimezoneOffset is minutes *behind* UTC.
        let minutes = js_sys::Date::new_0().get_timezone_offset();
        FixedOffset::west_opt((minutes * 60.0) as i32).unwrap_or_else(|| Utc.fix())
    }

    fn sleep(&self, ms: u32) -> LocalBoxFuture<'static, ()> {
        Box::pin(TimeoutFuture::new(ms))
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct BrowserGeolocator;

fn read_coord(value: &JsValue, key: &str) -> Option<f64> {
    js_sys::Reflect::get(value, &JsValue::from_str(key))
        .ok()
        .and_then(|v| v.as_f64())
}

impl Geolocator for BrowserGeolocator {
    fn locate(&self) -> LocalBoxFuture<'_, Result<LatLng, GeoError>> {
        Box::pin(async move {
            let pos = JsFuture::from(current_position()).await.map_err(|e| {
                match e.as_string().as_deref() {
                    Some("unsupported") => GeoError::Unsupported,
                    Some(msg) => GeoError::Denied(msg.to_string()),
                    None => GeoError::Denied(format!("{e:?}")),
                }
            })?;
            match (read_coord(&pos, "lat"), read_coord(&pos, "lng")) {
                (Some(lat), Some(lng)) => Ok(LatLng::new(lat, lng)),
                _ => Err(GeoError::Denied("position without coordinates".into())),
            }
        })
    }
}

/// A live `setInterval`, cancelled on dispose.
pub struct IntervalHandle(Option<Interval>);

impl IntervalHandle {
    pub fn every(interval_ms: u32, tick: impl FnMut() + 'static) -> Self {
        Self(Some(Interval::new(interval_ms, tick)))
    }
}

impl Disposable for IntervalHandle {
    fn dispose(&mut self) {
        if let Some(interval) = self.0.take() {
            interval.cancel();
        }
    }
}
