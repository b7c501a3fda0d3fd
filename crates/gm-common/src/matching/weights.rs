/// 지원사업 매칭 항목별 만점
/// 합계는 100 (산업 30 / TRL 20 / 유형 20 / 경험 15 / 마감 15)
pub const PROGRAM_BANDS: ProgramBands = ProgramBands {
    industry: 30,
    trl: 20,
    org_type: 20,
    experience: 15,
    deadline: 15,
};

/// 파트너 호환성 항목별 만점
/// TRL 보완성을 가장 크게 본다 (TRL 40 / 산업 30 / 규모 15 / 경험 15)
pub const PARTNER_BANDS: PartnerBands = PartnerBands {
    trl_fit: 40,
    industry: 30,
    scale: 15,
    experience: 15,
};

#[derive(Debug, Clone, Copy)]
pub struct ProgramBands {
    pub industry: u8,
    pub trl: u8,
    pub org_type: u8,
    pub experience: u8,
    pub deadline: u8,
}

impl ProgramBands {
    pub fn sum(&self) -> u32 {
        [
            self.industry,
            self.trl,
            self.org_type,
            self.experience,
            self.deadline,
        ]
        .iter()
        .map(|v| *v as u32)
        .sum()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct PartnerBands {
    pub trl_fit: u8,
    pub industry: u8,
    pub scale: u8,
    pub experience: u8,
}

impl PartnerBands {
    pub fn sum(&self) -> u32 {
        [self.trl_fit, self.industry, self.scale, self.experience]
            .iter()
            .map(|v| *v as u32)
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bands_sum_to_hundred() {
        assert_eq!(PROGRAM_BANDS.sum(), 100);
        assert_eq!(PARTNER_BANDS.sum(), 100);
    }
}
