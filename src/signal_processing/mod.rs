pub mod analytic;
pub mod bessel;
pub mod fft;
pub mod hilbert_fir;
pub mod kaiser;

pub use analytic::{AnalyticSignalBuilder, BandRemoval};
pub use bessel::bessel_i0;
pub use fft::{FftProvider, ForwardPlan, InversePlan, RustFftProvider};
pub use hilbert_fir::{HilbertFir, ScanOrder};
pub use kaiser::{FilterSpec, FilterTaps, MAX_FILTER_ORDER, filter_coeff, normalize_order};
