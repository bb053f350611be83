use std::collections::BTreeMap;
use std::ops::Range;

use crate::blend::FuelBlend;
use crate::error::{Error, Result};
use crate::leg::{score_leg, BlendDecoder, ScenarioParams, TripLeg};
use crate::regulatory::RegulatoryData;
use crate::voyage::{aggregate, AggregationMode, VoyageBreakdown};

use super::projection::SHARE_CAP;
use super::solver::Objective;

/// Voyage cost as a function of the candidate percentages of every leg.
///
/// Variables are laid out leg by leg; legs without candidates (berth legs,
/// legs on shore power) contribute an empty block.
#[derive(Debug)]
pub struct VoyageProblem<'a> {
    data: &'a RegulatoryData,
    legs: &'a [TripLeg],
    params: ScenarioParams,
    aggregation: AggregationMode,
    decoders: Vec<Option<BlendDecoder>>,
    blocks: Vec<Range<usize>>,
    dimension: usize,
}

impl<'a> VoyageProblem<'a> {
    /// Validate the inputs and resolve each leg's decoder.
    ///
    /// Fails with `InfeasibleRegion` when a fixed tonnage exceeds its leg's demand.
    pub fn new(
        data: &'a RegulatoryData,
        legs: &'a [TripLeg],
        params: ScenarioParams,
        aggregation: AggregationMode,
    ) -> Result<Self> {
        params.validate()?;
        if legs.is_empty() {
            return Err(Error::invalid_scenario("voyage has no legs"));
        }

        let mut decoders = Vec::with_capacity(legs.len());
        let mut blocks = Vec::with_capacity(legs.len());
        let mut offset = 0;
        for leg in legs {
            leg.validate()?;
            let decoder = if leg.uses_ops() {
                None
            } else {
                Some(leg.decoder(data)?)
            };
            let width = decoder.as_ref().map_or(0, BlendDecoder::dimension);
            blocks.push(offset..offset + width);
            offset += width;
            decoders.push(decoder);
        }

        Ok(Self {
            data,
            legs,
            params,
            aggregation,
            decoders,
            blocks,
            dimension: offset,
        })
    }

    pub fn legs(&self) -> &[TripLeg] {
        self.legs
    }

    pub fn decoders(&self) -> impl Iterator<Item = Option<&BlendDecoder>> {
        self.decoders.iter().map(Option::as_ref)
    }

    /// All residual energy on the fixed fuel.
    pub fn baseline(&self) -> Vec<f64> {
        vec![0.0; self.dimension]
    }

    /// Residual energy split evenly between the fixed fuel and every candidate.
    pub fn even_split(&self) -> Vec<f64> {
        let mut x = vec![0.0; self.dimension];
        for block in &self.blocks {
            let share = SHARE_CAP / (block.len() + 1) as f64;
            for value in &mut x[block.clone()] {
                *value = share;
            }
        }
        x
    }

    fn check_dimension(&self, x: &[f64]) -> Result<()> {
        if x.len() != self.dimension {
            return Err(Error::invalid_scenario(format!(
                "decision vector has {} variables, expected {}",
                x.len(),
                self.dimension
            )));
        }
        Ok(())
    }

    /// Tonnages of every leg at `x`.
    pub fn decode(&self, x: &[f64]) -> Result<Vec<FuelBlend>> {
        self.check_dimension(x)?;
        self.decoders
            .iter()
            .zip(&self.blocks)
            .map(|(decoder, block)| match decoder {
                Some(decoder) => decoder.decode(&x[block.clone()]),
                None => Ok(FuelBlend::new()),
            })
            .collect()
    }

    /// Candidate percentages of each leg at `x`, keyed by fuel.
    pub fn shares(&self, x: &[f64]) -> Result<Vec<BTreeMap<String, f64>>> {
        self.check_dimension(x)?;
        let shares = self
            .decoders
            .iter()
            .zip(&self.blocks)
            .map(|(decoder, block)| match decoder {
                Some(decoder) => decoder
                    .candidates()
                    .iter()
                    .cloned()
                    .zip(x[block.clone()].iter().copied())
                    .collect(),
                None => BTreeMap::new(),
            })
            .collect();
        Ok(shares)
    }

    /// Full voyage breakdown at `x`.
    pub fn breakdown(&self, x: &[f64]) -> Result<VoyageBreakdown> {
        let blends = self.decode(x)?;
        let results = self
            .legs
            .iter()
            .zip(&blends)
            .map(|(leg, blend)| score_leg(self.data, leg, blend, &self.params))
            .collect::<Result<Vec<_>>>()?;
        aggregate(self.data, results, &self.params, self.aggregation)
    }
}

impl Objective for VoyageProblem<'_> {
    fn dimension(&self) -> usize {
        self.dimension
    }

    fn blocks(&self) -> &[Range<usize>] {
        &self.blocks
    }

    fn evaluate(&self, x: &[f64]) -> Result<f64> {
        Ok(self.breakdown(x)?.totals.total_cost)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::leg::TripKind;
    use crate::regulatory::{FuelProperties, PriceBounds, PriceSchedule, RegulatoryTargets};

    fn data() -> RegulatoryData {
        let priced = |fuel: FuelProperties| {
            fuel.with_prices(PriceSchedule::generic(PriceBounds::new(600.0, 700.0)))
        };
        RegulatoryData::new(
            [
                priced(FuelProperties::new("MDO", 42_700.0, 90.77, 3.206)),
                priced(FuelProperties::new("VLSFO", 41_000.0, 91.4, 3.151)),
            ],
            RegulatoryTargets::new(91.16).with_reduction(2030, 6.0),
        )
        .unwrap()
    }

    #[test]
    fn wrong_length_decision_vector_is_rejected() {
        let data = data();
        let legs = [
            TripLeg::new(TripKind::IntraEu, 1.0e6).with_candidates(["VLSFO"]),
            TripLeg::new(TripKind::Berth, 2.0e5),
        ];
        let problem = VoyageProblem::new(
            &data,
            &legs,
            ScenarioParams::new(2030, 90.0),
            AggregationMode::Pooled,
        )
        .unwrap();
        assert_eq!(problem.dimension(), 1);

        for x in [vec![], vec![10.0, 20.0]] {
            assert!(matches!(problem.decode(&x), Err(Error::InvalidScenario { .. })));
            assert!(matches!(problem.shares(&x), Err(Error::InvalidScenario { .. })));
            assert!(matches!(problem.breakdown(&x), Err(Error::InvalidScenario { .. })));
        }
        assert_eq!(problem.shares(&[25.0]).unwrap()[0]["VLSFO"], 25.0);
    }
}
