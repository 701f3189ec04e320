/// Month alignment of the two normalized series.
///
/// An inner join on exact month-start equality: months present in only
/// one series are silently excluded. The deforestation series is gap-free
/// across its domain, so the joined coverage is exactly the pollution
/// series' months intersected with the deforestation domain.

use std::cmp::Ordering;

use crate::model::{AlignedObservation, MonthlyDeforestationPoint, MonthlyPollutionPoint};

/// Join the two monthly series. Both inputs must be ascending by month,
/// which is how the normalizers emit them; the output is ascending too.
pub fn align(
    deforestation: &[MonthlyDeforestationPoint],
    pollution: &[MonthlyPollutionPoint],
) -> Vec<AlignedObservation> {
    let mut out = Vec::new();
    let mut d = deforestation.iter().peekable();
    let mut p = pollution.iter().peekable();

    while let (Some(dp), Some(pp)) = (d.peek(), p.peek()) {
        match dp.month.cmp(&pp.month) {
            Ordering::Less => {
                d.next();
            }
            Ordering::Greater => {
                p.next();
            }
            Ordering::Equal => {
                out.push(AlignedObservation {
                    month: dp.month,
                    area_ha: dp.area_ha,
                    pollution: pp.values,
                });
                d.next();
                p.next();
            }
        }
    }

    out
}
