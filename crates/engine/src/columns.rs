use serde::{Deserialize, Serialize};

/// Semantic column positions (1-based) for one station's manifest layout.
///
/// Stations receive manifests with different physical layouts, so each
/// transformation stage resolves its columns through the active profile.
/// An absent optional column means the stage that needs it does not apply
/// at that station.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnProfile {
    pub order_number: usize,
    pub declared_value: usize,
    /// Probed by the trailing-row trim; an empty cell marks a stub row.
    pub trailing_probe: usize,
    pub buyer_name: Option<usize>,
    pub buyer_address: Option<usize>,
    pub net_weight: Option<usize>,
    /// Side column receiving prorated weight. None means proration
    /// overwrites the net-weight column.
    pub proration: Option<usize>,
    pub hs_code: Option<usize>,
    pub description: Option<usize>,
    pub box_number: Option<usize>,
    /// Column receiving the routed airtable code.
    pub routing: Option<usize>,
    pub consignee_id: Option<usize>,
    pub unlocode: Option<usize>,
    pub origin_city: Option<usize>,
    pub origin_postcode: Option<usize>,
    pub sequence: Option<usize>,
    pub package_number: Option<usize>,
    /// Administrative column dropped when its header matches
    /// `admin_header`.
    pub admin_column: Option<usize>,
    pub admin_header: Option<String>,
}

impl ColumnProfile {
    /// Layout shared by the LGG, ATH, and SOB stations.
    pub fn lgg() -> Self {
        ColumnProfile {
            order_number: 29,
            declared_value: 21,
            trailing_probe: 20,
            buyer_name: Some(13),
            buyer_address: Some(14),
            net_weight: Some(23),
            proration: Some(24),
            hs_code: Some(25),
            description: Some(26),
            box_number: Some(32),
            routing: Some(34),
            consignee_id: Some(18),
            unlocode: Some(22),
            origin_city: Some(10),
            origin_postcode: Some(11),
            sequence: Some(6),
            package_number: Some(1),
            admin_column: Some(30),
            admin_header: Some("Customer Ref".to_string()),
        }
    }

    pub fn otp() -> Self {
        ColumnProfile {
            order_number: 1,
            declared_value: 23,
            trailing_probe: 20,
            buyer_name: Some(14),
            buyer_address: Some(15),
            net_weight: Some(5),
            proration: None,
            hs_code: Some(19),
            description: Some(6),
            box_number: None,
            routing: None,
            consignee_id: None,
            unlocode: None,
            // The OTP feed swaps these two relative to the LGG layout.
            origin_city: Some(11),
            origin_postcode: Some(10),
            sequence: None,
            package_number: Some(1),
            admin_column: None,
            admin_header: None,
        }
    }

    pub fn beg() -> Self {
        ColumnProfile {
            order_number: 2,
            declared_value: 17,
            trailing_probe: 2,
            buyer_name: None,
            buyer_address: None,
            net_weight: None,
            proration: None,
            hs_code: None,
            description: None,
            box_number: None,
            routing: None,
            consignee_id: None,
            unlocode: None,
            origin_city: None,
            origin_postcode: None,
            sequence: None,
            package_number: None,
            admin_column: None,
            admin_header: None,
        }
    }

    /// Both identity columns, when the layout carries them.
    pub fn buyer_columns(&self) -> Option<(usize, usize)> {
        match (self.buyer_name, self.buyer_address) {
            (Some(name), Some(address)) => Some((name, address)),
            _ => None,
        }
    }

    /// Both classifier columns, when the layout carries them.
    pub fn classifier_columns(&self) -> Option<(usize, usize)> {
        match (self.hs_code, self.description) {
            (Some(code), Some(description)) => Some((code, description)),
            _ => None,
        }
    }
}
