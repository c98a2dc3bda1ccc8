use anyhow::{anyhow, Context, Result};
use geo::Point;
use serde::Deserialize;
use serde_json::Value;
use typed_floats::tf64::NonNaN;
use ureq::{Agent, Request};

use crate::config::Settings;
use crate::geodist;
use crate::model::{Company, Place};

pub struct PlacesClient {
    agent: Agent,
    key: String,
    base_url: String,
}

impl PlacesClient {
    pub fn new(settings: &Settings) -> Self {
        Self {
            agent: Agent::new(),
            key: settings.google.api_key.clone(),
            base_url: settings.google.base_url.clone(),
        }
    }

    fn endpoint(&self, endpoint: &str, query: &[(&str, &str)]) -> Request {
        let mut request = self.agent.get(&format!("{}/{endpoint}/json", self.base_url));
        for (key, value) in query {
            request = request.query(key, value);
        }
        request.query("key", &self.key)
    }

    /// One nearby search, reduced to the closest candidate for this keyword.
    pub fn search(&self, company: &Company, origin: Point, keyword: &str) -> Result<Option<Place>> {
        let location = format!("{},{}", origin.y(), origin.x());
        let raw = self
            .endpoint(
                "nearbysearch",
                &[
                    ("location", location.as_str()),
                    ("keyword", keyword),
                    ("rankby", "distance"),
                ],
            )
            .call()?
            .into_string()?;

        parse_search(&raw, keyword, company, origin)
    }

    /// Fills in name, address and phone for a place that has an id.
    pub fn load_details(&self, place: Place) -> Result<Place> {
        let distance = f64::from(place.distance);
        let prefix = if distance < 5.0 { "💋 " } else { "" };
        println!(
            "{prefix}Found something interesting {distance:.2}m away from {}…",
            place.company_display()
        );

        let Some(id) = place.id.clone() else {
            return Ok(place);
        };

        let raw = self
            .endpoint("details", &[("placeid", id.as_str())])
            .call()?
            .into_string()?;
        Ok(merge_details(&raw, place))
    }
}

#[derive(Deserialize)]
struct SearchResponse {
    status: String,
    error_message: Option<String>,
    #[serde(default)]
    results: Vec<Value>,
}

#[derive(Deserialize)]
struct SearchResult {
    place_id: Option<String>,
    geometry: Geometry,
}

#[derive(Deserialize)]
struct Geometry {
    location: Location,
}

#[derive(Deserialize)]
struct Location {
    lat: f64,
    lng: f64,
}

/// Reduces a nearby-search body to a Place, or None when the search came
/// back without a usable candidate. Bodies that can't be read at all are
/// logged and count as no candidate; a result whose coordinates don't
/// convert is a hard error.
pub fn parse_search(
    raw: &str,
    keyword: &str,
    company: &Company,
    origin: Point,
) -> Result<Option<Place>> {
    let response: SearchResponse = match serde_json::from_str(raw) {
        Ok(x) => x,
        Err(err) => {
            eprintln!("Unreadable search response: {err}");
            return Ok(None);
        }
    };

    if response.status != "OK" {
        if let Some(error) = response.error_message {
            eprintln!("{}: {error}", response.status);
        } else if response.status != "ZERO_RESULTS" {
            eprintln!("Places API status: {}", response.status);
        }
        return Ok(None);
    }

    let Some(first) = response.results.into_iter().next() else {
        return Ok(None);
    };
    let result: SearchResult =
        serde_json::from_value(first).context("search result has no usable location")?;

    let location = result.geometry.location;
    let point = Point::new(location.lng, location.lat);
    let distance = NonNaN::new(geodist::meters(origin, point))
        .map_err(|err| anyhow!("invalid distance for keyword {keyword}: {err}"))?;

    Ok(Some(Place {
        id: result.place_id,
        keyword: keyword.to_string(),
        latitude: location.lat,
        longitude: location.lng,
        distance,
        name: String::new(),
        address: String::new(),
        phone: String::new(),
        cnpj: company.cnpj_digits(),
        company_name: company.name.clone(),
        company_trade_name: company.trade_name.clone(),
    }))
}

#[derive(Deserialize)]
struct DetailsResponse {
    result: Option<DetailsResult>,
}

#[derive(Default, Deserialize)]
struct DetailsResult {
    #[serde(default)]
    name: String,
    #[serde(default)]
    formatted_address: String,
    #[serde(default)]
    formatted_phone_number: String,
}

/// Merges a details body into the place. Empty bodies, unreadable bodies
/// and bodies without a result leave the place untouched; missing fields
/// become empty strings.
pub fn merge_details(raw: &str, mut place: Place) -> Place {
    if raw.trim().is_empty() {
        return place;
    }

    let response: DetailsResponse = match serde_json::from_str(raw) {
        Ok(x) => x,
        Err(err) => {
            eprintln!("Unreadable details response: {err}");
            return place;
        }
    };
    let Some(result) = response.result else {
        return place;
    };

    place.name = result.name;
    place.address = result.formatted_address;
    place.phone = result.formatted_phone_number;
    place
}
