use super::{reason::ReasonCode, weights::PROGRAM_BANDS};
use crate::TrlRange;

/// TRL 비교 결과
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrlAssessment {
    pub points: u8,
    pub reason: ReasonCode,
    /// 가까운 경계까지의 거리 (범위 안이면 0, 판단 불가면 None)
    pub gap: Option<u8>,
}

impl TrlAssessment {
    fn new(points: u8, reason: ReasonCode, gap: Option<u8>) -> Self {
        Self {
            points,
            reason,
            gap,
        }
    }
}

/// TRL 미입력 시 기본 점수
pub const TRL_NOT_PROVIDED_POINTS: u8 = 5;

/// 기관 TRL 과 허용 범위를 비교해 0〜20 점을 매긴다.
///
/// 범위 위쪽(과잉 성숙)은 아래쪽(미성숙)보다 같은 거리에서 항상 높게 평가한다.
///
/// | 거리 | 미달 | 초과 |
/// |---|---|---|
/// | 1 | 12 | 15 |
/// | 2 | 6 | 10 |
/// | 3 | 0 | 5 |
/// | 4+ | 0 | 0 |
pub fn score_trl(org_trl: Option<u8>, range: Option<TrlRange>) -> TrlAssessment {
    // TRL 미입력은 범위 유무보다 먼저 판정한다
    let Some(trl) = org_trl else {
        return TrlAssessment::new(TRL_NOT_PROVIDED_POINTS, ReasonCode::TrlNotProvided, None);
    };

    let Some(range) = range.filter(|r| !r.is_unconstrained()) else {
        return TrlAssessment::new(PROGRAM_BANDS.trl, ReasonCode::TrlNoRequirement, None);
    };

    let (min, max) = range.bounds();
    if (min..=max).contains(&trl) {
        return TrlAssessment::new(PROGRAM_BANDS.trl, ReasonCode::TrlPerfectMatch, Some(0));
    }

    let below = trl < min;
    let distance = if below { min - trl } else { trl - max };

    let (points, reason) = match (distance, below) {
        (1, true) => (12, ReasonCode::TrlTooLowClose),
        (1, false) => (15, ReasonCode::TrlTooHighClose),
        (2, true) => (6, ReasonCode::TrlTooLowModerate),
        (2, false) => (10, ReasonCode::TrlTooHighModerate),
        (3, false) => (5, ReasonCode::TrlTooHighFar),
        _ => (0, ReasonCode::TrlTooFar),
    };

    TrlAssessment::new(points, reason, Some(distance))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn range(min: u8, max: u8) -> Option<TrlRange> {
        Some(TrlRange::bounded(min, max))
    }

    #[test]
    fn missing_org_trl_scores_default() {
        let result = score_trl(None, range(4, 8));
        assert_eq!(result.points, 5);
        assert_eq!(result.reason, ReasonCode::TrlNotProvided);
    }

    #[test]
    fn empty_range_takes_precedence_over_range_check() {
        for org_trl in [Some(1), Some(9)] {
            let result = score_trl(org_trl, None);
            assert_eq!(result.points, 20);
            assert_eq!(result.reason, ReasonCode::TrlNoRequirement);

            let result = score_trl(org_trl, Some(TrlRange::default()));
            assert_eq!(result.reason, ReasonCode::TrlNoRequirement);
        }
    }

    #[test]
    fn missing_org_trl_wins_over_empty_range() {
        for range in [None, Some(TrlRange::default())] {
            let result = score_trl(None, range);
            assert_eq!(result.points, TRL_NOT_PROVIDED_POINTS);
            assert_eq!(result.reason, ReasonCode::TrlNotProvided);
            assert_eq!(result.gap, None);
        }
    }

    #[test]
    fn inside_range_is_perfect() {
        for trl in 4..=8 {
            let result = score_trl(Some(trl), range(4, 8));
            assert_eq!(result.points, 20);
            assert_eq!(result.reason, ReasonCode::TrlPerfectMatch);
        }
    }

    #[test]
    fn one_below_scores_twelve() {
        let result = score_trl(Some(5), range(6, 9));
        assert_eq!(result.points, 12);
        assert_eq!(result.reason, ReasonCode::TrlTooLowClose);
        assert_eq!(result.gap, Some(1));
    }

    #[test]
    fn one_above_scores_fifteen() {
        let above = score_trl(Some(5), range(1, 4));
        assert_eq!(above.points, 15);
        assert_eq!(above.reason, ReasonCode::TrlTooHighClose);
        assert!(above.points > score_trl(Some(5), range(6, 9)).points);
    }

    #[test]
    fn tiers_follow_distance_and_direction() {
        assert_eq!(score_trl(Some(3), range(5, 6)).points, 6);
        assert_eq!(score_trl(Some(8), range(5, 6)).points, 10);
        assert_eq!(score_trl(Some(2), range(5, 6)).points, 0);
        assert_eq!(score_trl(Some(2), range(5, 6)).reason, ReasonCode::TrlTooFar);
        assert_eq!(score_trl(Some(9), range(5, 6)).points, 5);
        assert_eq!(score_trl(Some(9), range(5, 6)).reason, ReasonCode::TrlTooHighFar);
        assert_eq!(score_trl(Some(9), range(1, 4)).reason, ReasonCode::TrlTooFar);
        assert_eq!(score_trl(Some(1), range(6, 9)).points, 0);
    }

    #[test]
    fn open_bounds_fill_to_scale_ends() {
        let result = score_trl(Some(9), Some(TrlRange::new(Some(6), None)));
        assert_eq!(result.reason, ReasonCode::TrlPerfectMatch);

        let result = score_trl(Some(4), Some(TrlRange::new(None, Some(3))));
        assert_eq!(result.reason, ReasonCode::TrlTooHighClose);
    }

    #[test]
    fn points_never_increase_with_distance() {
        let (min, max) = (4, 6);
        let below: Vec<u8> = (1..min)
            .rev()
            .map(|trl| score_trl(Some(trl), range(min, max)).points)
            .collect();
        let above: Vec<u8> = ((max + 1)..=9)
            .map(|trl| score_trl(Some(trl), range(min, max)).points)
            .collect();

        assert!(below.windows(2).all(|w| w[0] >= w[1]), "{below:?}");
        assert!(above.windows(2).all(|w| w[0] >= w[1]), "{above:?}");
        for (b, a) in below.iter().zip(above.iter()) {
            assert!(a >= b);
        }
    }
}
