//! In-memory flow network
//!
//! Segments are indexed by id and by hydrologic sequence. An inflow index
//! (`sequence -> segments draining into it`, through either the major or
//! the minor downstream link) makes tributary walks a lookup instead of a
//! scan. Walks are breadth-first from the seed; each segment is admitted at
//! most once, so malformed cyclic links cannot loop.

use crate::geometry::{simplify_basin, union_catchments};
use async_trait::async_trait;
use geo::{Contains, Distance, Euclidean, MultiPolygon, Point};
use hydronav_core::io::NetworkDocument;
use hydronav_core::network::{Adjacency, Segment, SegmentId, TraversalRequest, NO_SEQUENCE};
use hydronav_core::{FeatureCatalog, FlowNetworkStore, Result, SourceFeature, SourceFeatureRef};
use std::collections::{BTreeSet, HashMap, VecDeque};
use tracing::debug;

/// Flow network held entirely in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryNetwork {
    segments: HashMap<SegmentId, Segment>,
    by_sequence: HashMap<u64, SegmentId>,
    inflows: HashMap<u64, Vec<SegmentId>>,
    /// Features keyed by lowercase source name
    features: HashMap<String, Vec<SourceFeature>>,
}

impl MemoryNetwork {
    pub fn new(segments: Vec<Segment>) -> Self {
        let mut network = Self::default();
        for segment in segments {
            network.insert(segment);
        }
        network
    }

    pub fn from_document(doc: NetworkDocument) -> Self {
        Self::new(doc.segments).with_features(doc.features)
    }

    pub fn with_features(mut self, features: Vec<SourceFeature>) -> Self {
        for feature in features {
            self.features
                .entry(feature.source.to_lowercase())
                .or_default()
                .push(feature);
        }
        self
    }

    fn insert(&mut self, segment: Segment) {
        if segment.sequence != NO_SEQUENCE {
            self.by_sequence.insert(segment.sequence, segment.id);
        }
        for link in [segment.down_sequence, segment.down_minor_sequence] {
            if link != NO_SEQUENCE {
                let entry = self.inflows.entry(link).or_default();
                entry.push(segment.id);
                entry.sort_unstable();
            }
        }
        self.segments.insert(segment.id, segment);
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn get(&self, id: SegmentId) -> Option<&Segment> {
        self.segments.get(&id)
    }

    fn by_sequence(&self, sequence: u64) -> Option<&Segment> {
        if sequence == NO_SEQUENCE {
            return None;
        }
        self.by_sequence
            .get(&sequence)
            .and_then(|id| self.segments.get(id))
    }

    fn neighbors(&self, segment: &Segment, adjacency: Adjacency) -> Vec<&Segment> {
        match adjacency {
            Adjacency::UpMain => self.by_sequence(segment.up_sequence).into_iter().collect(),
            Adjacency::Inflows => self
                .inflows
                .get(&segment.sequence)
                .map(|ids| ids.iter().filter_map(|id| self.segments.get(id)).collect())
                .unwrap_or_default(),
            Adjacency::Down => self.by_sequence(segment.down_sequence).into_iter().collect(),
            Adjacency::DownWithMinor => {
                let mut out: Vec<&Segment> =
                    self.by_sequence(segment.down_sequence).into_iter().collect();
                if segment.has_minor_downstream() {
                    out.extend(self.by_sequence(segment.down_minor_sequence));
                }
                out
            }
        }
    }

    /// Run a bounded walk; the seed is always part of the result.
    pub fn walk(&self, request: &TraversalRequest) -> BTreeSet<SegmentId> {
        let mut visited = BTreeSet::new();
        visited.insert(request.seed.id);

        let mut queue: VecDeque<&Segment> = VecDeque::new();
        if request.expands(&request.seed) {
            queue.push_back(&request.seed);
        }

        while let Some(current) = queue.pop_front() {
            for next in self.neighbors(current, request.adjacency) {
                if visited.contains(&next.id) || !request.admits(next) {
                    continue;
                }
                visited.insert(next.id);
                if request.expands(next) {
                    queue.push_back(next);
                }
            }
        }

        debug!(
            "walk {} from {} admitted {} segments",
            request.mode,
            request.seed.id,
            visited.len()
        );
        visited
    }

    /// Segment whose catchment contains `point`, else the nearest flowline
    /// within `tolerance`.
    pub fn project(&self, point: Point<f64>, tolerance: f64) -> Option<SegmentId> {
        let mut ids: Vec<&SegmentId> = self.segments.keys().collect();
        ids.sort_unstable();

        let containing = ids.iter().find(|id| {
            self.segments[**id]
                .catchment
                .as_ref()
                .is_some_and(|c| c.contains(&point))
        });
        if let Some(id) = containing {
            return Some(**id);
        }

        ids.into_iter()
            .filter_map(|id| {
                let d = Euclidean::distance(&point, &self.segments[id].geometry);
                (d <= tolerance).then_some((*id, d))
            })
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(id, _)| id)
    }

    /// Union the catchments of `ids`, optionally simplified.
    pub fn union(&self, ids: &BTreeSet<SegmentId>, simplify_tolerance: Option<f64>) -> MultiPolygon<f64> {
        let basin = union_catchments(
            ids.iter()
                .filter_map(|id| self.segments.get(id))
                .filter_map(|s| s.catchment.as_ref()),
        );
        match simplify_tolerance {
            Some(tolerance) => simplify_basin(&basin, tolerance),
            None => basin,
        }
    }

    fn features_of(&self, source: &str) -> &[SourceFeature] {
        self.features
            .get(&source.to_lowercase())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

#[async_trait]
impl FlowNetworkStore for MemoryNetwork {
    async fn segment(&self, id: SegmentId) -> Result<Option<Segment>> {
        Ok(self.segments.get(&id).cloned())
    }

    async fn resolve_graph(&self, request: &TraversalRequest) -> Result<BTreeSet<SegmentId>> {
        Ok(self.walk(request))
    }

    async fn project_point(&self, point: Point<f64>, tolerance: f64) -> Result<Option<SegmentId>> {
        Ok(self.project(point, tolerance))
    }

    async fn union_and_simplify(
        &self,
        ids: &BTreeSet<SegmentId>,
        simplify_tolerance: Option<f64>,
    ) -> Result<MultiPolygon<f64>> {
        Ok(self.union(ids, simplify_tolerance))
    }
}

#[async_trait]
impl FeatureCatalog for MemoryNetwork {
    async fn feature(&self, reference: &SourceFeatureRef) -> Result<Option<SourceFeature>> {
        Ok(self
            .features_of(&reference.source)
            .iter()
            .find(|f| f.identifier == reference.identifier)
            .cloned())
    }

    async fn features_on(
        &self,
        source: &str,
        ids: &BTreeSet<SegmentId>,
    ) -> Result<Vec<SourceFeature>> {
        Ok(self
            .features_of(source)
            .iter()
            .filter(|f| f.segment.is_some_and(|s| ids.contains(&s)))
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{Geometry, LineString, Polygon};
    use hydronav_core::network::{NavigationMode, COASTAL_CLASS_CODE};

    /// Y-shaped network:
    ///
    /// ```text
    ///   a (seq 30) ─┐
    ///               ├─> c (seq 10) ─> d (seq 5, terminal)
    ///   b (seq 20) ─┘
    /// ```
    fn y_network() -> MemoryNetwork {
        let line = |x0: f64, x1: f64| LineString::from(vec![(x0, 0.0), (x1, 0.0)]);
        let rect = |x0: f64, x1: f64| {
            Polygon::new(
                LineString::from(vec![(x0, -1.0), (x1, -1.0), (x1, 1.0), (x0, 1.0), (x0, -1.0)]),
                vec![],
            )
        };

        let mut a = Segment::new(1, 30, line(0.0, 1.0));
        a.down_sequence = 10;
        a.mainstem_path_id = 100;
        a.terminal_path_id = 5;
        a.path_length = 2.0;
        a.length = 1.0;
        a.is_network_start = true;
        a.catchment = Some(rect(0.0, 1.0));

        let mut b = Segment::new(2, 20, line(0.0, 1.0));
        b.down_sequence = 10;
        b.mainstem_path_id = 200;
        b.terminal_path_id = 5;
        b.path_length = 2.0;
        b.length = 1.0;
        b.is_network_start = true;

        let mut c = Segment::new(3, 10, line(1.0, 2.0));
        c.down_sequence = 5;
        c.up_sequence = 30;
        c.mainstem_path_id = 100;
        c.terminal_path_id = 5;
        c.path_length = 1.0;
        c.length = 1.0;
        c.catchment = Some(rect(1.0, 2.0));

        let mut d = Segment::new(4, 5, line(2.0, 3.0));
        d.up_sequence = 10;
        d.mainstem_path_id = 100;
        d.terminal_path_id = 5;
        d.length = 1.0;
        d.is_network_terminal = true;
        d.catchment = Some(rect(2.0, 3.0));

        MemoryNetwork::new(vec![a, b, c, d])
    }

    fn ids(v: &[u64]) -> BTreeSet<SegmentId> {
        v.iter().copied().map(SegmentId).collect()
    }

    fn walk(net: &MemoryNetwork, seed: u64, mode: NavigationMode) -> BTreeSet<SegmentId> {
        let seed = net.get(SegmentId(seed)).unwrap();
        net.walk(&TraversalRequest::for_mode(seed, mode, None))
    }

    #[test]
    fn test_inflow_index() {
        let net = y_network();
        assert_eq!(net.inflows[&10], vec![SegmentId(1), SegmentId(2)]);
        assert_eq!(net.len(), 4);
    }

    #[test]
    fn test_walk_modes() {
        let net = y_network();
        assert_eq!(walk(&net, 4, NavigationMode::UpstreamTributaries), ids(&[1, 2, 3, 4]));
        assert_eq!(walk(&net, 4, NavigationMode::UpstreamMain), ids(&[1, 3, 4]));
        assert_eq!(walk(&net, 2, NavigationMode::DownstreamMain), ids(&[2, 3, 4]));
        assert_eq!(walk(&net, 3, NavigationMode::DownstreamDiversions), ids(&[3, 4]));
    }

    #[test]
    fn test_walk_stops_at_coast() {
        let mut net = y_network();
        let mut d = net.get(SegmentId(4)).unwrap().clone();
        d.class_code = COASTAL_CLASS_CODE;
        net.insert(d);
        assert_eq!(walk(&net, 1, NavigationMode::DownstreamMain), ids(&[1, 3]));
        // A coastal seed is still returned
        assert_eq!(walk(&net, 4, NavigationMode::UpstreamTributaries), ids(&[4]));
    }

    #[test]
    fn test_walk_survives_cycle() {
        let mut net = y_network();
        let mut d = net.get(SegmentId(4)).unwrap().clone();
        d.is_network_terminal = false;
        d.down_sequence = 30; // loops back to a
        net.insert(d);
        assert_eq!(walk(&net, 1, NavigationMode::DownstreamDiversions), ids(&[1, 3, 4]));
    }

    #[test]
    fn test_project_point() {
        let net = y_network();
        assert_eq!(net.project(Point::new(1.5, 0.5), 0.0), Some(SegmentId(3)));
        // Outside every catchment: nearest flowline within tolerance, lowest id on ties
        assert_eq!(net.project(Point::new(-0.3, 0.0), 0.5), Some(SegmentId(1)));
        assert_eq!(net.project(Point::new(9.0, 9.0), 0.5), None);
    }

    #[test]
    fn test_project_measures_to_line_end() {
        let net = y_network();
        // Beyond the terminal flowline's end at (3, 0): 0.3606 away
        assert_eq!(net.project(Point::new(3.2, 0.3), 0.4), Some(SegmentId(4)));
        assert_eq!(net.project(Point::new(3.2, 0.3), 0.35), None);
    }

    #[test]
    fn test_union_skips_missing_catchments() {
        let net = y_network();
        let basin = net.union(&ids(&[1, 2, 3]), None);
        assert_eq!(basin.0.len(), 1);
        assert!((crate::geometry::area(&basin) - 4.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_feature_catalog() {
        let mut site = SourceFeature::new("WQP", "USGS-1", Geometry::Point(Point::new(1.5, 0.0)));
        site.segment = Some(SegmentId(3));
        let net = y_network().with_features(vec![site]);

        let found = net
            .feature(&SourceFeatureRef::new("wqp", "USGS-1"))
            .await
            .unwrap();
        assert!(found.is_some());
        assert!(net
            .feature(&SourceFeatureRef::new("wqp", "USGS-2"))
            .await
            .unwrap()
            .is_none());

        let on = net.features_on("wqp", &ids(&[3, 4])).await.unwrap();
        assert_eq!(on.len(), 1);
        let off = net.features_on("wqp", &ids(&[1])).await.unwrap();
        assert!(off.is_empty());
    }
}
