//! `⎕`-system configuration: index origin, comparison tolerance, print
//! precision/width, and the SI-depth limit. Builder-style (construct, then
//! override before use) rather than a global singleton.

/// Live `⎕IO`/`⎕CT`/`⎕PP`/`⎕PW` plus the SI-depth limit. One instance lives
/// on the [`crate::workspace::Workspace`]; `⎕`-system-variable reads/writes
/// go through it rather than through the ordinary symbol table.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quad {
    /// Index origin, 0 or 1.
    pub io: i64,
    /// Comparison tolerance, `0 <= ct <= 1e-9`.
    pub ct: f64,
    /// Print precision, `>= 1`.
    pub pp: u32,
    /// Print width, `>= 30`.
    pub pw: u32,
    /// SI stack depth limit (default 64, per the test scenarios).
    pub si_depth_limit: usize,
}

impl Default for Quad {
    fn default() -> Self {
        Quad {
            io: 1,
            ct: 1e-13,
            pp: 10,
            pw: 80,
            si_depth_limit: 64,
        }
    }
}

impl Quad {
    pub fn new() -> Self {
        Quad::default()
    }

    pub fn with_io(mut self, io: i64) -> Self {
        self.io = io;
        self
    }

    pub fn with_ct(mut self, ct: f64) -> Self {
        self.ct = ct;
        self
    }

    pub fn with_pp(mut self, pp: u32) -> Self {
        self.pp = pp;
        self
    }

    pub fn with_pw(mut self, pw: u32) -> Self {
        self.pw = pw;
        self
    }

    pub fn with_si_depth_limit(mut self, limit: usize) -> Self {
        self.si_depth_limit = limit;
        self
    }

    pub fn io_valid(&self) -> bool {
        self.io == 0 || self.io == 1
    }

    pub fn ct_valid(&self) -> bool {
        (0.0..=1e-9).contains(&self.ct)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_iso_core_table() {
        let q = Quad::default();
        assert_eq!(q.io, 1);
        assert_eq!(q.ct, 1e-13);
        assert_eq!(q.pp, 10);
        assert_eq!(q.pw, 80);
        assert_eq!(q.si_depth_limit, 64);
    }

    #[test]
    fn builder_overrides_defaults() {
        let q = Quad::new().with_io(0).with_ct(1e-9).with_si_depth_limit(8);
        assert_eq!(q.io, 0);
        assert_eq!(q.ct, 1e-9);
        assert_eq!(q.si_depth_limit, 8);
        assert!(q.io_valid());
        assert!(q.ct_valid());
    }

    #[test]
    fn invalid_io_and_ct_are_detectable() {
        let q = Quad::new().with_io(2).with_ct(1.0);
        assert!(!q.io_valid());
        assert!(!q.ct_valid());
    }
}
