//! Real counters backing `--profile-cache`, rather than a no-op flag.

#[derive(Debug, Default, Clone, Copy)]
pub struct CacheStats {
    pub hits: u32,
    pub misses: u32,
    pub writes: u32,
    pub invalidations: u32,
}

impl CacheStats {
    pub fn record_hit(&mut self) {
        self.hits += 1;
    }

    pub fn record_miss(&mut self) {
        self.misses += 1;
    }

    pub fn record_write(&mut self) {
        self.writes += 1;
    }

    pub fn record_invalidation(&mut self) {
        self.invalidations += 1;
    }

    pub fn report(&self, graph_nodes: usize, graph_edges: usize) -> String {
        format!(
            "cache: {} hit(s), {} miss(es), {} write(s), {} invalidation(s); graph: {} node(s), {} edge(s)",
            self.hits, self.misses, self.writes, self.invalidations, graph_nodes, graph_edges
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_includes_every_counter() {
        let mut stats = CacheStats::default();
        stats.record_hit();
        stats.record_miss();
        stats.record_write();
        stats.record_invalidation();
        let report = stats.report(3, 5);
        assert!(report.contains("1 hit"));
        assert!(report.contains("1 miss"));
        assert!(report.contains("3 node"));
        assert!(report.contains("5 edge"));
    }
}
