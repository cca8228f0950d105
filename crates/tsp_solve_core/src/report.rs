use serde::Serialize;

use crate::error::Result;
use crate::matrix::Distance;
use crate::tour::Tour;
use crate::tsplib::Instance;

/// Final solver output: `route` is present only when the instance was given
/// as coordinates, `tour` lists cities by 1-based rank in visit order, and
/// `cost` includes the wraparound edge.
#[derive(Debug, Serialize)]
pub struct Report {
    #[serde(skip_serializing_if = "Option::is_none")]
    route: Option<Vec<[f64; 2]>>,
    tour: Vec<usize>,
    cost: Distance,
}

impl Report {
    pub fn new(instance: &Instance, tour: &Tour, cost: Distance) -> Self {
        let route = instance.nodes.as_ref().map(|nodes| {
            tour.order()
                .iter()
                .map(|&city| [nodes[city].x, nodes[city].y])
                .collect()
        });
        let ranks = tour.order().iter().map(|&city| city + 1).collect();

        Self {
            route,
            tour: ranks,
            cost,
        }
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| crate::Error::other(format!("report serialization failed: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::Report;
    use crate::tour::Tour;
    use crate::tsplib::Instance;

    #[test]
    fn explicit_instances_emit_tour_and_cost_only() {
        let instance = Instance::parse(
            "DIMENSION: 3\nEDGE_WEIGHT_TYPE: EXPLICIT\nEDGE_WEIGHT_FORMAT: UPPER_ROW\n\
             EDGE_WEIGHT_SECTION\n10 15 20\nEOF\n",
        )
        .expect("parse");
        let tour = Tour::new(vec![0, 1, 2]);

        let json = Report::new(&instance, &tour, 45).to_json().expect("json");
        assert_eq!(json, r#"{"tour":[1,2,3],"cost":45}"#);
    }

    #[test]
    fn coordinate_instances_emit_route_in_visit_order() {
        let instance = Instance::parse(
            "DIMENSION: 3\nEDGE_WEIGHT_TYPE: EUC_2D\n\
             NODE_COORD_SECTION\n1 0.0 0.0\n2 3.0 4.0\n3 6.0 0.0\nEOF\n",
        )
        .expect("parse");
        let tour = Tour::new(vec![0, 2, 1]);

        let json = Report::new(&instance, &tour, 16).to_json().expect("json");
        assert_eq!(
            json,
            r#"{"route":[[0.0,0.0],[6.0,0.0],[3.0,4.0]],"tour":[1,3,2],"cost":16}"#
        );
    }
}
