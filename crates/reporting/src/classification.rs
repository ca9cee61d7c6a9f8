//! Account classification for balance sheet placement.
//!
//! Precedence: explicit category metadata from the catalog, then the code
//! ranges below, then name keywords as a legacy fallback for unclassified
//! accounts. Keyword hits are marked so callers can surface them.

use std::ops::RangeInclusive;

use bursar_ledger::{Account, AccountCategory, AccountType};

const CURRENT_ASSET_CODES: RangeInclusive<u32> = 1000..=1499;
const NON_CURRENT_ASSET_CODES: RangeInclusive<u32> = 1500..=1999;
const CURRENT_LIABILITY_CODES: RangeInclusive<u32> = 2000..=2499;
const NON_CURRENT_LIABILITY_CODES: RangeInclusive<u32> = 2500..=2999;
const CAPITAL_CODES: RangeInclusive<u32> = 3000..=3099;
const RETAINED_EARNINGS_CODES: RangeInclusive<u32> = 3100..=3199;

const CURRENT_ASSET_KEYWORDS: [&str; 5] = ["cash", "bank", "receivable", "inventory", "prepaid"];
const CURRENT_LIABILITY_KEYWORDS: [&str; 5] = ["payable", "accrued", "deposit", "advance", "tax"];

/// How a classification was decided.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassificationBasis {
    /// Category metadata set on the account itself.
    Explicit,
    /// The documented code-range table.
    CodeRange,
    /// Equity bucketing by account name.
    NameMatch,
    /// Legacy name-keyword fallback.
    Keyword,
    /// Nothing matched; the type's default bucket.
    TypeDefault,
}

/// A category plus the rule that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classified {
    pub category: AccountCategory,
    pub basis: ClassificationBasis,
}

impl Classified {
    fn new(category: AccountCategory, basis: ClassificationBasis) -> Self {
        Self { category, basis }
    }

    /// True when the category came from the legacy keyword fallback.
    pub fn is_heuristic(&self) -> bool {
        self.basis == ClassificationBasis::Keyword
    }
}

/// Section category for `account`.
pub fn classify(account: &Account) -> Classified {
    if let Some(category) = account.category {
        return Classified::new(category, ClassificationBasis::Explicit);
    }
    match account.account_type {
        AccountType::Asset => classify_asset(account),
        AccountType::Liability => classify_liability(account),
        AccountType::Equity => classify_equity(account),
        AccountType::Income => Classified::new(
            AccountCategory::OperatingIncome,
            ClassificationBasis::TypeDefault,
        ),
        AccountType::Expense => Classified::new(
            AccountCategory::OperatingExpense,
            ClassificationBasis::TypeDefault,
        ),
    }
}

fn classify_asset(account: &Account) -> Classified {
    if let Some(code) = code_prefix(&account.code) {
        if CURRENT_ASSET_CODES.contains(&code) {
            return Classified::new(AccountCategory::CurrentAsset, ClassificationBasis::CodeRange);
        }
        if NON_CURRENT_ASSET_CODES.contains(&code) {
            return Classified::new(
                AccountCategory::NonCurrentAsset,
                ClassificationBasis::CodeRange,
            );
        }
    }
    if name_matches(&account.name, &CURRENT_ASSET_KEYWORDS) {
        return Classified::new(AccountCategory::CurrentAsset, ClassificationBasis::Keyword);
    }
    Classified::new(
        AccountCategory::NonCurrentAsset,
        ClassificationBasis::TypeDefault,
    )
}

fn classify_liability(account: &Account) -> Classified {
    if let Some(code) = code_prefix(&account.code) {
        if CURRENT_LIABILITY_CODES.contains(&code) {
            return Classified::new(
                AccountCategory::CurrentLiability,
                ClassificationBasis::CodeRange,
            );
        }
        if NON_CURRENT_LIABILITY_CODES.contains(&code) {
            return Classified::new(
                AccountCategory::NonCurrentLiability,
                ClassificationBasis::CodeRange,
            );
        }
    }
    if name_matches(&account.name, &CURRENT_LIABILITY_KEYWORDS) {
        return Classified::new(
            AccountCategory::CurrentLiability,
            ClassificationBasis::Keyword,
        );
    }
    Classified::new(
        AccountCategory::NonCurrentLiability,
        ClassificationBasis::TypeDefault,
    )
}

fn classify_equity(account: &Account) -> Classified {
    if let Some(code) = code_prefix(&account.code) {
        if CAPITAL_CODES.contains(&code) {
            return Classified::new(AccountCategory::Capital, ClassificationBasis::CodeRange);
        }
        if RETAINED_EARNINGS_CODES.contains(&code) {
            return Classified::new(
                AccountCategory::RetainedEarnings,
                ClassificationBasis::CodeRange,
            );
        }
    }
    let name = account.name.to_lowercase();
    if name.contains("retained") {
        return Classified::new(
            AccountCategory::RetainedEarnings,
            ClassificationBasis::NameMatch,
        );
    }
    if name.contains("capital") {
        return Classified::new(AccountCategory::Capital, ClassificationBasis::NameMatch);
    }
    Classified::new(AccountCategory::OtherEquity, ClassificationBasis::TypeDefault)
}

/// Leading digits of an account code, so suffixed codes like `2310-xyz`
/// still land in their range.
fn code_prefix(code: &str) -> Option<u32> {
    let digits: &str = code
        .split_once(|c: char| !c.is_ascii_digit())
        .map_or(code, |(digits, _)| digits);
    if digits.is_empty() {
        return None;
    }
    digits.parse().ok()
}

fn name_matches(name: &str, keywords: &[&str]) -> bool {
    let name = name.to_lowercase();
    keywords.iter().any(|keyword| name.contains(keyword))
}
