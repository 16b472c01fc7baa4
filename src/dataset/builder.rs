//! Consumes GTFS tables via a [`BlobSource`] and produces an immutable
//! [`Dataset`]. Load order: shapes → stops → routes → trips → calendar →
//! calendar exceptions → stop times, then derive `cumulative_distance` and
//! per-stop `shape_dist`.

use std::collections::HashMap;

use tracing::warn;

use crate::blob::{BlobError, BlobSource};
use crate::tabular::TabularReader;

use super::geometry::{cumulative_distances, haversine_m, nearest_point_index};
use super::{
    Calendar, CalendarException, Dataset, ExceptionKind, Route, Shape, ShapePoint, Stop, StopTime,
    Trip,
};

pub struct DatasetBuilder<'a> {
    source: &'a dyn BlobSource,
}

impl<'a> DatasetBuilder<'a> {
    pub fn new(source: &'a dyn BlobSource) -> Self {
        Self { source }
    }

    pub fn build(self) -> anyhow::Result<Dataset> {
        let mut dataset = Dataset::default();

        self.load_shapes(&mut dataset)?;
        self.load_stops(&mut dataset)?;
        self.load_routes(&mut dataset)?;
        self.load_trips(&mut dataset)?;
        self.load_calendar(&mut dataset)?;
        self.load_calendar_dates(&mut dataset)?;
        self.load_stop_times(&mut dataset)?;

        for trip in dataset.trips.values() {
            dataset
                .trips_by_service
                .entry(trip.service_id.clone())
                .or_default()
                .push(trip.id.clone());
        }

        derive_shape_distances(&mut dataset);

        Ok(dataset)
    }

    fn open_optional(&self, name: &str) -> anyhow::Result<Option<Box<dyn std::io::Read + Send>>> {
        match self.source.open(name) {
            Ok(r) => Ok(Some(r)),
            Err(BlobError::NotFound(_)) => {
                warn!(file = name, "GTFS table missing, leaving index empty");
                Ok(None)
            }
            Err(BlobError::Transport(msg)) => {
                anyhow::bail!("transport failure reading {name}: {msg}")
            }
        }
    }

    fn load_shapes(&self, dataset: &mut Dataset) -> anyhow::Result<()> {
        let Some(reader) = self.open_optional("shapes.txt")? else {
            return Ok(());
        };
        let mut reader = TabularReader::new(reader);
        let mut raw: HashMap<String, Vec<(i64, f64, f64)>> = HashMap::new();

        for row in reader.records() {
            let row = row?;
            let shape_id = row.get("shape_id").to_string();
            if shape_id.is_empty() {
                continue;
            }
            let (Some(seq), Some(lat), Some(lon)) = (
                parse_i64(row.get("shape_pt_sequence")),
                parse_f64(row.get("shape_pt_lat")),
                parse_f64(row.get("shape_pt_lon")),
            ) else {
                warn!(shape_id, "skipping malformed shape point row");
                continue;
            };
            raw.entry(shape_id).or_default().push((seq, lat, lon));
        }

        for (shape_id, mut points) in raw {
            points.sort_by_key(|(seq, _, _)| *seq);
            let coords: Vec<(f64, f64)> = points.iter().map(|(_, lat, lon)| (*lat, *lon)).collect();
            let cumulative_distance = cumulative_distances(&coords);
            let points = points
                .into_iter()
                .map(|(_, lat, lon)| ShapePoint { lat, lon })
                .collect();
            dataset.shapes.insert(
                shape_id.clone(),
                Shape {
                    id: shape_id,
                    points,
                    cumulative_distance,
                },
            );
        }
        Ok(())
    }

    fn load_stops(&self, dataset: &mut Dataset) -> anyhow::Result<()> {
        let Some(reader) = self.open_optional("stops.txt")? else {
            return Ok(());
        };
        let mut reader = TabularReader::new(reader);
        for row in reader.records() {
            let row = row?;
            let id = row.get("stop_id").to_string();
            if id.is_empty() {
                continue;
            }
            let (Some(lat), Some(lon)) =
                (parse_f64(row.get("stop_lat")), parse_f64(row.get("stop_lon")))
            else {
                warn!(stop_id = id, "skipping stop with malformed coordinates");
                continue;
            };
            dataset.stops.insert(
                id.clone(),
                Stop {
                    id,
                    name: row.get("stop_name").to_string(),
                    lat,
                    lon,
                    code: row.get("stop_code").to_string(),
                    desc: row.get("stop_desc").to_string(),
                    zone_id: row.get("zone_id").to_string(),
                    url: row.get("stop_url").to_string(),
                    location_type: row.get("location_type").to_string(),
                    parent_station: row.get("parent_station").to_string(),
                },
            );
        }
        Ok(())
    }

    fn load_routes(&self, dataset: &mut Dataset) -> anyhow::Result<()> {
        let Some(reader) = self.open_optional("routes.txt")? else {
            return Ok(());
        };
        let mut reader = TabularReader::new(reader);
        for row in reader.records() {
            let row = row?;
            let id = row.get("route_id").to_string();
            if id.is_empty() {
                continue;
            }
            let route_type = parse_i64(row.get("route_type")).unwrap_or(3) as i32;
            dataset.routes.insert(
                id.clone(),
                Route {
                    id,
                    short_name: row.get("route_short_name").to_string(),
                    long_name: row.get("route_long_name").to_string(),
                    route_type,
                    color: row.get("route_color").to_string(),
                    text_color: row.get("route_text_color").to_string(),
                    agency_id: row.get("agency_id").to_string(),
                    desc: row.get("route_desc").to_string(),
                    url: row.get("route_url").to_string(),
                },
            );
        }
        Ok(())
    }

    fn load_trips(&self, dataset: &mut Dataset) -> anyhow::Result<()> {
        let Some(reader) = self.open_optional("trips.txt")? else {
            return Ok(());
        };
        let mut reader = TabularReader::new(reader);
        for row in reader.records() {
            let row = row?;
            let id = row.get("trip_id").to_string();
            if id.is_empty() {
                continue;
            }
            let shape_id = row.get("shape_id").to_string();
            dataset.trips.insert(
                id.clone(),
                Trip {
                    id,
                    route_id: row.get("route_id").to_string(),
                    service_id: row.get("service_id").to_string(),
                    shape_id: if shape_id.is_empty() { None } else { Some(shape_id) },
                    headsign: row.get("trip_headsign").to_string(),
                    direction: parse_i64(row.get("direction_id")).map(|d| d as i32),
                    short_name: row.get("trip_short_name").to_string(),
                    block_id: row.get("block_id").to_string(),
                    wheelchair_accessible: row.get("wheelchair_accessible").to_string(),
                    bikes_allowed: row.get("bikes_allowed").to_string(),
                    stop_times: Vec::new(),
                },
            );
        }
        Ok(())
    }

    fn load_calendar(&self, dataset: &mut Dataset) -> anyhow::Result<()> {
        let Some(reader) = self.open_optional("calendar.txt")? else {
            return Ok(());
        };
        let mut reader = TabularReader::new(reader);
        for row in reader.records() {
            let row = row?;
            let service_id = row.get("service_id").to_string();
            if service_id.is_empty() {
                continue;
            }
            let mut days = [false; 7];
            days[1] = parse_flag(row.get("monday"));
            days[2] = parse_flag(row.get("tuesday"));
            days[3] = parse_flag(row.get("wednesday"));
            days[4] = parse_flag(row.get("thursday"));
            days[5] = parse_flag(row.get("friday"));
            days[6] = parse_flag(row.get("saturday"));
            days[0] = parse_flag(row.get("sunday"));

            dataset.calendars.insert(
                service_id.clone(),
                Calendar {
                    service_id,
                    days,
                    start_date: row.get("start_date").to_string(),
                    end_date: row.get("end_date").to_string(),
                },
            );
        }
        Ok(())
    }

    fn load_calendar_dates(&self, dataset: &mut Dataset) -> anyhow::Result<()> {
        let Some(reader) = self.open_optional("calendar_dates.txt")? else {
            return Ok(());
        };
        let mut reader = TabularReader::new(reader);
        for row in reader.records() {
            let row = row?;
            let service_id = row.get("service_id").to_string();
            let date = row.get("date").to_string();
            if service_id.is_empty() || date.is_empty() {
                continue;
            }
            let kind = match row.get("exception_type") {
                "1" => ExceptionKind::Add,
                "2" => ExceptionKind::Remove,
                other => {
                    warn!(exception_type = other, "skipping unknown exception_type");
                    continue;
                }
            };
            dataset
                .calendar_exceptions_by_date
                .entry(date.clone())
                .or_default()
                .push((service_id.clone(), kind));
            dataset
                .calendar_exceptions
                .push(CalendarException { date, service_id, kind });
        }
        Ok(())
    }

    fn load_stop_times(&self, dataset: &mut Dataset) -> anyhow::Result<()> {
        let Some(reader) = self.open_optional("stop_times.txt")? else {
            return Ok(());
        };
        let mut reader = TabularReader::new(reader);
        for row in reader.records() {
            let row = row?;
            let trip_id = row.get("trip_id").to_string();
            let Some(trip) = dataset.trips.get_mut(&trip_id) else {
                continue;
            };
            let (Some(stop_sequence), Some(arrival_seconds), Some(departure_seconds)) = (
                parse_i64(row.get("stop_sequence")),
                parse_gtfs_time(row.get("arrival_time")),
                parse_gtfs_time(row.get("departure_time")),
            ) else {
                warn!(trip_id, "skipping malformed stop_time row");
                continue;
            };
            trip.stop_times.push(StopTime {
                stop_sequence,
                stop_id: row.get("stop_id").to_string(),
                arrival_seconds,
                departure_seconds,
                shape_dist: 0.0,
            });
        }
        for trip in dataset.trips.values_mut() {
            trip.stop_times.sort_by_key(|st| st.stop_sequence);
        }
        Ok(())
    }
}

/// The geometric post-pass: derive every `shape_dist` from geometry,
/// discarding any `shape_dist_traveled` the source feed may have carried.
fn derive_shape_distances(dataset: &mut Dataset) {
    for trip in dataset.trips.values_mut() {
        if trip.stop_times.is_empty() {
            continue;
        }
        let shape = trip.shape_id.as_ref().and_then(|id| dataset.shapes.get(id));

        match shape {
            Some(shape) if !shape.points.is_empty() => {
                let coords: Vec<(f64, f64)> =
                    shape.points.iter().map(|p| (p.lat, p.lon)).collect();
                for st in trip.stop_times.iter_mut() {
                    let stop_coord = dataset.stops.get(&st.stop_id).map(|s| (s.lat, s.lon));
                    let Some((lat, lon)) = stop_coord else {
                        continue;
                    };
                    if let Some(idx) = nearest_point_index(&coords, lat, lon) {
                        st.shape_dist = shape.cumulative_distance[idx];
                    }
                }
            }
            _ => {
                let mut running = 0.0;
                let mut prev_coord: Option<(f64, f64)> = None;
                for st in trip.stop_times.iter_mut() {
                    let Some((lat, lon)) = dataset.stops.get(&st.stop_id).map(|s| (s.lat, s.lon))
                    else {
                        st.shape_dist = running;
                        continue;
                    };
                    if let Some((plat, plon)) = prev_coord {
                        running += haversine_m(plat, plon, lat, lon);
                    }
                    st.shape_dist = running;
                    prev_coord = Some((lat, lon));
                }
            }
        }
    }
}

fn parse_f64(s: &str) -> Option<f64> {
    if s.is_empty() {
        return None;
    }
    s.parse().ok()
}

fn parse_i64(s: &str) -> Option<i64> {
    if s.is_empty() {
        return None;
    }
    s.parse().ok()
}

fn parse_flag(s: &str) -> bool {
    s == "1"
}

/// GTFS `HH:MM:SS` seconds-since-local-midnight, allowing `HH` to exceed 23
/// for trips running past midnight.
fn parse_gtfs_time(s: &str) -> Option<i64> {
    let mut parts = s.trim().splitn(3, ':');
    let h: i64 = parts.next()?.parse().ok()?;
    let m: i64 = parts.next()?.parse().ok()?;
    let sec: i64 = parts.next()?.parse().ok()?;
    Some(h * 3600 + m * 60 + sec)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_past_midnight_times() {
        assert_eq!(parse_gtfs_time("25:00:00"), Some(25 * 3600));
        assert_eq!(parse_gtfs_time("09:05:30"), Some(9 * 3600 + 5 * 60 + 30));
        assert_eq!(parse_gtfs_time(""), None);
    }

    #[test]
    fn missing_table_leaves_index_empty_without_failing() {
        let source = crate::blob::LocalBlobSource::new(std::env::temp_dir());
        let dataset = DatasetBuilder::new(&source).build().unwrap();
        assert!(dataset.stops.is_empty());
        assert!(dataset.shapes.is_empty());
    }
}
