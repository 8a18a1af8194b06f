use num_complex::Complex64;

/// Hungarian is O(n^3) with dense scratch rows; above this size the greedy
/// matcher takes over.
pub const HUNGARIAN_MAX: usize = 32;

/// How a fast-mode run keeps root identity stable across steps.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MatchStrategy {
    /// Greedy nearest-neighbor every 4th step. Default: cheapest option
    /// that still keeps colors attached between solver calls.
    Assign4,
    /// Greedy nearest-neighbor every step.
    Assign1,
    /// Optimal assignment (Kuhn-Munkres) every step.
    Hungarian1,
}

impl MatchStrategy {
    pub fn label(self) -> &'static str {
        match self {
            Self::Assign4 => "assign4",
            Self::Assign1 => "assign1",
            Self::Hungarian1 => "hungarian1",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "assign4" => Some(Self::Assign4),
            "assign1" => Some(Self::Assign1),
            "hungarian1" => Some(Self::Hungarian1),
            _ => None,
        }
    }

    /// Whether this strategy matches at the given offset into a worker's
    /// step range.
    pub fn matches_at(self, step_in_range: usize) -> bool {
        match self {
            Self::Assign4 => step_in_range % 4 == 0,
            Self::Assign1 | Self::Hungarian1 => true,
        }
    }

    /// Run the matcher this strategy calls for, reordering `new` to align
    /// with `prev`.
    pub fn apply(self, new: &mut [Complex64], prev: &[Complex64]) {
        match self {
            Self::Hungarian1 => hungarian_match(new, prev),
            Self::Assign1 | Self::Assign4 => match_root_order(new, prev),
        }
    }
}

/// Greedy nearest-neighbor correspondence.
///
/// For each previous root, in slot order, claims the closest unmatched new
/// root (squared Euclidean distance, first-found tie-break) and places it in
/// that slot. Mismatched cardinality or an empty previous set degrades to
/// pass-through: `new` is left exactly as given.
pub fn match_root_order(new: &mut [Complex64], prev: &[Complex64]) {
    let n = new.len();
    if n == 0 || n != prev.len() {
        return;
    }

    let mut used = vec![false; n];
    let mut out = vec![Complex64::new(0.0, 0.0); n];
    for i in 0..n {
        let mut best_j = 0;
        let mut best_d = f64::INFINITY;
        for j in 0..n {
            if used[j] {
                continue;
            }
            let d2 = (new[j] - prev[i]).norm_sqr();
            if d2 < best_d {
                best_d = d2;
                best_j = j;
            }
        }
        out[i] = new[best_j];
        used[best_j] = true;
    }
    new.copy_from_slice(&out);
}

/// Minimum-cost bipartite assignment (Kuhn-Munkres) between `new` and
/// `prev` roots under squared Euclidean cost; reorders `new` so slot `i`
/// holds the new root optimally assigned to `prev[i]`.
///
/// Guarantees globally minimal total cost; which of several equally optimal
/// assignments is returned is unspecified. Beyond [`HUNGARIAN_MAX`] roots
/// the greedy matcher is used instead.
pub fn hungarian_match(new: &mut [Complex64], prev: &[Complex64]) {
    let n = new.len();
    if n == 0 || n != prev.len() {
        return;
    }
    if n > HUNGARIAN_MAX {
        match_root_order(new, prev);
        return;
    }

    let cost = |i: usize, j: usize| (new[j] - prev[i]).norm_sqr();

    const INF: f64 = 1e18;
    // 1-based potentials/assignment, column 0 is the virtual source.
    let mut u = vec![0.0f64; n + 1];
    let mut v = vec![0.0f64; n + 1];
    let mut p = vec![0usize; n + 1];
    let mut way = vec![0usize; n + 1];

    for i in 1..=n {
        p[0] = i;
        let mut j0 = 0usize;
        let mut minv = vec![INF; n + 1];
        let mut used = vec![false; n + 1];

        loop {
            used[j0] = true;
            let i0 = p[j0];
            let mut delta = INF;
            let mut j1 = 0usize;
            for j in 1..=n {
                if used[j] {
                    continue;
                }
                let cur = cost(i0 - 1, j - 1) - u[i0] - v[j];
                if cur < minv[j] {
                    minv[j] = cur;
                    way[j] = j0;
                }
                if minv[j] < delta {
                    delta = minv[j];
                    j1 = j;
                }
            }
            for j in 0..=n {
                if used[j] {
                    u[p[j]] += delta;
                    v[j] -= delta;
                } else {
                    minv[j] -= delta;
                }
            }
            j0 = j1;
            if p[j0] == 0 {
                break;
            }
        }

        loop {
            let j1 = way[j0];
            p[j0] = p[j1];
            j0 = j1;
            if j0 == 0 {
                break;
            }
        }
    }

    let mut out = vec![Complex64::new(0.0, 0.0); n];
    for j in 1..=n {
        out[p[j] - 1] = new[j - 1];
    }
    new.copy_from_slice(&out);
}

/// Total squared-distance cost of the identity assignment `new[i] -> prev[i]`.
pub fn assignment_cost(new: &[Complex64], prev: &[Complex64]) -> f64 {
    new.iter()
        .zip(prev)
        .map(|(a, b)| (a - b).norm_sqr())
        .sum()
}
