use anyhow::Result;
use itertools::Itertools;

use crate::model::{Company, Place};
use crate::places::PlacesClient;

/// Search terms, one nearby search each, in this order.
pub const KEYWORDS: [&str; 12] = [
    "acompanhantes",
    "adult entertainment club",
    "adult entertainment store",
    "gay sauna",
    "massagem",
    "modeling agency",
    "motel",
    "night club",
    "sex club",
    "sex shop",
    "strip club",
    "swinger clubs",
];

/// The closest relevant place to a company, details filled in, or None
/// when the company has no usable coordinates or every candidate was
/// rejected.
pub fn closest(client: &PlacesClient, company: &Company) -> Result<Option<Place>> {
    let Some(origin) = company.point() else {
        eprintln!(
            "No geolocation information for company: {} ({})",
            company.display_name(),
            company.cnpj
        );
        return Ok(None);
    };

    let mut candidates = Vec::new();
    for keyword in KEYWORDS {
        println!("{}", lookup_line(keyword, company));
        if let Some(place) = client.search(company, origin, keyword)? {
            candidates.push(place);
        }
    }

    select(candidates, |place| client.load_details(place))
}

// the per-keyword diagnostic names the company by its legal name
fn lookup_line(keyword: &str, company: &Company) -> String {
    format!(
        "Looking for a {keyword} near {} ({})…",
        company.name, company.cnpj
    )
}

// google returns hotels when asked for a motel
fn conflated_hotel(place: &Place) -> bool {
    place.keyword == "motel" && place.name.to_lowercase().contains("hotel")
}

/// Walks the candidates by ascending distance, enriching each with
/// details, and returns the first one that isn't a motel search matching
/// a hotel. The details step is injected so the ordering rules can be
/// exercised without a network.
pub fn select(
    candidates: Vec<Place>,
    mut details: impl FnMut(Place) -> Result<Place>,
) -> Result<Option<Place>> {
    for place in candidates.into_iter().sorted_by_key(|x| x.distance) {
        let place = details(place)?;
        if conflated_hotel(&place) {
            continue;
        }
        return Ok(Some(place));
    }

    Ok(None)
}
