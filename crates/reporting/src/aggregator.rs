use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;

use chrono::NaiveDate;
use tracing::{debug, info, warn};

use bursar_core::ResidenceId;
use bursar_ledger::{
    Account, AccountCatalog, AccountCategory, AccountScope, EntryFilter, EntryStatus,
    JournalEntry, JournalStore, LedgerWarning,
};

use crate::classification::classify;
use crate::error::ReportError;
use crate::options::ReportOptions;
use crate::sheet::{
    AccountBalance, BalanceSheet, EquationReport, EquitySection, Ratios, SectionGroup,
    SectionLine,
};

/// Permitted |Assets - (Liabilities + Equity)| before a sheet is flagged
/// unbalanced, in minor units.
const EQUATION_TOLERANCE: i64 = 1;

/// Folds posted journal entries into a classified balance sheet.
///
/// Reads are side-effect-free and re-derive everything from the store on
/// every call; two calls over an unchanged ledger produce identical output.
pub struct BalanceSheetAggregator {
    store: Arc<dyn JournalStore>,
    catalog: Arc<dyn AccountCatalog>,
    options: ReportOptions,
}

/// Per-account debit/credit accumulation.
struct FoldedAccount {
    account: Account,
    debit: i128,
    credit: i128,
}

/// An account's signed net balance plus its section category.
struct ComputedAccount {
    account: Account,
    category: AccountCategory,
    net: i128,
}

impl BalanceSheetAggregator {
    pub fn new(store: Arc<dyn JournalStore>, catalog: Arc<dyn AccountCatalog>) -> Self {
        Self {
            store,
            catalog,
            options: ReportOptions::default(),
        }
    }

    pub fn with_options(mut self, options: ReportOptions) -> Self {
        self.options = options;
        self
    }

    /// Balance sheet over all posted entries dated on or before `as_of`,
    /// optionally restricted to one residence. Company-scope accounts ignore
    /// the residence restriction.
    pub fn balance_sheet(
        &self,
        as_of: NaiveDate,
        residence: Option<ResidenceId>,
    ) -> Result<BalanceSheet, ReportError> {
        let mut warnings = Vec::new();
        let folded = self.fold_balances(as_of, residence, &mut warnings)?;

        let mut computed: Vec<ComputedAccount> = Vec::with_capacity(folded.len());
        for f in folded.into_values() {
            let net = net_balance(&f, as_of, &mut warnings);
            let class = classify(&f.account);
            if class.is_heuristic() {
                warn!(account = %f.account.code, "account classified by name keyword");
                warnings.push(LedgerWarning::HeuristicClassification {
                    account_code: f.account.code.clone(),
                    account_name: f.account.name.clone(),
                });
            }
            computed.push(ComputedAccount {
                account: f.account,
                category: class.category,
                net,
            });
        }
        debug!(%as_of, accounts = computed.len(), "account balances folded");

        // Display folding: direct children of a summary parent appear inside
        // the parent's line instead of their own.
        let summary_codes: HashSet<&str> = computed
            .iter()
            .filter(|c| c.account.summary)
            .map(|c| c.account.code.as_str())
            .collect();
        let mut child_nets: HashMap<&str, i128> = HashMap::new();
        for c in &computed {
            if let Some(parent) = c.account.parent_code.as_deref() {
                if summary_codes.contains(parent) {
                    *child_nets.entry(parent).or_insert(0) += c.net;
                }
            }
        }

        let mut assets_current = Vec::new();
        let mut assets_non_current = Vec::new();
        let mut liabilities_current = Vec::new();
        let mut liabilities_non_current = Vec::new();
        let mut capital_lines = Vec::new();
        let mut other_equity_lines = Vec::new();
        let mut totals = [0i128; 6];
        let mut income_to_date = 0i128;
        let mut expenses_to_date = 0i128;

        for c in &computed {
            let hidden = c
                .account
                .parent_code
                .as_deref()
                .is_some_and(|parent| summary_codes.contains(parent));
            let display = if c.account.summary {
                c.net + child_nets.get(c.account.code.as_str()).copied().unwrap_or(0)
            } else {
                c.net
            };

            let (lines, total) = match c.category {
                AccountCategory::OperatingIncome => {
                    income_to_date += c.net;
                    continue;
                }
                AccountCategory::OperatingExpense => {
                    expenses_to_date += c.net;
                    continue;
                }
                // Derived from activity below; a stored balance here would
                // surface in the equation difference instead.
                AccountCategory::RetainedEarnings => continue,
                AccountCategory::CurrentAsset => (&mut assets_current, &mut totals[0]),
                AccountCategory::NonCurrentAsset => (&mut assets_non_current, &mut totals[1]),
                AccountCategory::CurrentLiability => (&mut liabilities_current, &mut totals[2]),
                AccountCategory::NonCurrentLiability => {
                    (&mut liabilities_non_current, &mut totals[3])
                }
                AccountCategory::Capital => (&mut capital_lines, &mut totals[4]),
                AccountCategory::OtherEquity => (&mut other_equity_lines, &mut totals[5]),
            };

            *total += c.net;
            if !hidden && display != 0 {
                lines.push(SectionLine {
                    account_code: c.account.code.clone(),
                    account_name: c.account.name.clone(),
                    amount: narrow(display)?,
                    summary: c.account.summary,
                });
            }
        }

        let [ac, anc, lc, lnc, capital, other] = totals;
        let retained = income_to_date - expenses_to_date;

        let assets = SectionGroup {
            current: assets_current,
            non_current: assets_non_current,
            current_total: narrow(ac)?,
            non_current_total: narrow(anc)?,
            total: narrow(ac + anc)?,
        };
        let liabilities = SectionGroup {
            current: liabilities_current,
            non_current: liabilities_non_current,
            current_total: narrow(lc)?,
            non_current_total: narrow(lnc)?,
            total: narrow(lc + lnc)?,
        };
        let mut equity = EquitySection {
            capital: capital_lines,
            other: other_equity_lines,
            capital_total: narrow(capital)?,
            other_total: narrow(other)?,
            retained_earnings: narrow(retained)?,
            income_to_date: narrow(income_to_date)?,
            expenses_to_date: narrow(expenses_to_date)?,
            total: narrow(capital + other + retained)?,
        };

        let difference = narrow((ac + anc) - (lc + lnc + capital + other + retained))?;
        let balanced = difference.abs() <= EQUATION_TOLERANCE;
        let correction = if !balanced && self.options.equation_correction {
            equity.retained_earnings += difference;
            equity.total += difference;
            Some(difference)
        } else {
            None
        };
        let equation = EquationReport {
            balanced,
            difference,
            correction,
        };

        let ratios = Ratios {
            working_capital: assets.current_total - liabilities.current_total,
            current_ratio: (liabilities.current_total != 0)
                .then(|| assets.current_total as f64 / liabilities.current_total as f64),
            debt_to_equity: (equity.total != 0)
                .then(|| liabilities.total as f64 / equity.total as f64),
        };

        info!(
            %as_of,
            residence = ?residence,
            assets = assets.total,
            liabilities = liabilities.total,
            equity = equity.total,
            balanced = equation.balanced,
            warnings = warnings.len(),
            "balance sheet aggregated"
        );

        Ok(BalanceSheet {
            as_of,
            residence,
            assets,
            liabilities,
            equity,
            ratios,
            equation,
            warnings,
        })
    }

    /// Flat nonzero balance per account, sorted by code. Includes income and
    /// expense accounts; no summary folding.
    pub fn account_balances(
        &self,
        as_of: NaiveDate,
        residence: Option<ResidenceId>,
    ) -> Result<Vec<AccountBalance>, ReportError> {
        let mut warnings = Vec::new();
        let folded = self.fold_balances(as_of, residence, &mut warnings)?;

        let mut listing = Vec::new();
        for f in folded.into_values() {
            let net = net_balance(&f, as_of, &mut warnings);
            if net == 0 {
                continue;
            }
            listing.push(AccountBalance {
                amount: narrow(net)?,
                account_type: f.account.account_type,
                account_code: f.account.code,
                account_name: f.account.name,
            });
        }

        debug!(%as_of, accounts = listing.len(), "account balances listed");
        Ok(listing)
    }

    /// Accumulates debits and credits per account code. Catalog accounts are
    /// always present; codes seen only in the journal are carried with the
    /// line's own name and type.
    fn fold_balances(
        &self,
        as_of: NaiveDate,
        residence: Option<ResidenceId>,
        warnings: &mut Vec<LedgerWarning>,
    ) -> Result<BTreeMap<String, FoldedAccount>, ReportError> {
        let mut folded = BTreeMap::new();
        for account in self.catalog.all()? {
            folded.insert(
                account.code.clone(),
                FoldedAccount {
                    account,
                    debit: 0,
                    credit: 0,
                },
            );
        }

        let company_codes: HashSet<String> = folded
            .values()
            .filter(|f| f.account.scope == AccountScope::Company)
            .map(|f| f.account.code.clone())
            .collect();
        let split_company = residence.is_some() && !company_codes.is_empty();

        if split_company {
            // Company-wide accounts keep their full balance under a
            // residence filter.
            let company_filter = EntryFilter {
                to_date: Some(as_of),
                status: Some(EntryStatus::Posted),
                account_codes: Some(company_codes.iter().cloned().collect()),
                ..Default::default()
            };
            for entry in self.store.query(&company_filter)? {
                fold_entry_lines(&mut folded, &entry, Some(&company_codes), true);
            }
        }

        let scoped_filter = EntryFilter {
            to_date: Some(as_of),
            status: Some(EntryStatus::Posted),
            residence,
            ..Default::default()
        };
        let company_split = split_company.then_some(&company_codes);
        for entry in self.store.query(&scoped_filter)? {
            let mut debit_total = 0i128;
            let mut credit_total = 0i128;
            for line in entry.lines() {
                debit_total += i128::from(line.debit);
                credit_total += i128::from(line.credit);
            }
            if debit_total != credit_total {
                let debit_total = i64::try_from(debit_total).unwrap_or(i64::MAX);
                let credit_total = i64::try_from(credit_total).unwrap_or(i64::MAX);
                warn!(
                    entry = %entry.id_typed(),
                    debit_total,
                    credit_total,
                    "unbalanced journal entry in scan"
                );
                warnings.push(LedgerWarning::UnbalancedEntry {
                    entry: entry.id_typed(),
                    debit_total,
                    credit_total,
                });
            }
            fold_entry_lines(&mut folded, &entry, company_split, false);
        }

        Ok(folded)
    }
}

/// Folds one entry's lines into the per-account accumulators. When a company
/// code set is given, `company_pass` selects which side of the split this
/// pass is responsible for.
fn fold_entry_lines(
    folded: &mut BTreeMap<String, FoldedAccount>,
    entry: &JournalEntry,
    company_codes: Option<&HashSet<String>>,
    company_pass: bool,
) {
    for line in entry.lines() {
        if let Some(codes) = company_codes {
            if codes.contains(&line.account_code) != company_pass {
                continue;
            }
        }
        let slot = folded
            .entry(line.account_code.clone())
            .or_insert_with(|| FoldedAccount {
                account: Account {
                    code: line.account_code.clone(),
                    name: line.account_name.clone(),
                    account_type: line.account_type,
                    category: None,
                    parent_code: None,
                    summary: false,
                    scope: AccountScope::Unit,
                    opening_balance: 0,
                    opening_balance_date: None,
                    active: true,
                },
                debit: 0,
                credit: 0,
            });
        slot.debit += i128::from(line.debit);
        slot.credit += i128::from(line.credit);
    }
}

/// Signed net balance for one account, opening balance included when its
/// date qualifies. Undated nonzero openings are excluded and flagged.
fn net_balance(
    folded: &FoldedAccount,
    as_of: NaiveDate,
    warnings: &mut Vec<LedgerWarning>,
) -> i128 {
    let account = &folded.account;
    let mut net = account.account_type.balance(folded.debit, folded.credit);
    if account.opening_balance != 0 {
        match account.opening_balance_date {
            Some(date) if date <= as_of => net += i128::from(account.opening_balance),
            Some(_) => {}
            None => {
                warn!(account = %account.code, "undated opening balance excluded");
                warnings.push(LedgerWarning::UndatedOpeningBalance {
                    account_code: account.code.clone(),
                });
            }
        }
    }
    net
}

fn narrow(amount: i128) -> Result<i64, ReportError> {
    i64::try_from(amount).map_err(|_| ReportError::AmountOverflow)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{chart, date, posted, posted_in, FakeCatalog, FakeJournal};
    use bursar_ledger::{AccountType, LineItem};

    fn aggregator_over(store: Arc<FakeJournal>) -> BalanceSheetAggregator {
        BalanceSheetAggregator::new(store, Arc::new(FakeCatalog::with(chart())))
    }

    fn capital_injection(on: NaiveDate, amount: i64) -> bursar_ledger::JournalEntry {
        posted(
            on,
            vec![
                LineItem::debit("1010", "Cash", AccountType::Asset, amount),
                LineItem::credit("3000", "Owner Capital", AccountType::Equity, amount),
            ],
        )
    }

    fn rent_accrual(on: NaiveDate, amount: i64) -> bursar_ledger::JournalEntry {
        posted(
            on,
            vec![
                LineItem::debit("1110", "Rent Receivable", AccountType::Asset, amount),
                LineItem::credit("4000", "Rent Income", AccountType::Income, amount),
            ],
        )
    }

    #[test]
    fn simple_ledger_produces_a_balanced_sheet() {
        let store = Arc::new(FakeJournal::new());
        store.seed(capital_injection(date(2026, 1, 5), 1_000_00));
        store.seed(rent_accrual(date(2026, 2, 1), 500_00));
        let aggregator = aggregator_over(store);

        let sheet = aggregator.balance_sheet(date(2026, 12, 31), None).unwrap();

        assert_eq!(sheet.assets.current_total, 1_500_00);
        assert_eq!(sheet.assets.total, 1_500_00);
        assert_eq!(sheet.liabilities.total, 0);
        assert_eq!(sheet.equity.capital_total, 1_000_00);
        assert_eq!(sheet.equity.income_to_date, 500_00);
        assert_eq!(sheet.equity.expenses_to_date, 0);
        assert_eq!(sheet.equity.retained_earnings, 500_00);
        assert_eq!(sheet.equity.total, 1_500_00);
        assert!(sheet.equation.balanced);
        assert_eq!(sheet.equation.difference, 0);
        assert_eq!(sheet.equation.correction, None);
        assert_eq!(sheet.ratios.working_capital, 1_500_00);
        assert_eq!(sheet.ratios.current_ratio, None);
        assert_eq!(sheet.ratios.debt_to_equity, Some(0.0));
        assert!(sheet.warnings.is_empty());
    }

    #[test]
    fn entries_after_the_as_of_date_are_excluded() {
        let store = Arc::new(FakeJournal::new());
        store.seed(capital_injection(date(2026, 1, 5), 100_00));
        store.seed(capital_injection(date(2026, 3, 5), 900_00));
        let mut voided = capital_injection(date(2026, 1, 20), 500_00);
        voided.void();
        store.seed(voided);
        let aggregator = aggregator_over(store);

        let sheet = aggregator.balance_sheet(date(2026, 2, 28), None).unwrap();

        assert_eq!(sheet.assets.total, 100_00);
        assert_eq!(sheet.equity.capital_total, 100_00);
        assert!(sheet.equation.balanced);
    }

    #[test]
    fn summary_parents_fold_children_without_double_counting() {
        let store = Arc::new(FakeJournal::new());
        store.seed(rent_accrual(date(2026, 1, 1), 200_00));
        store.seed(posted(
            date(2026, 1, 1),
            vec![
                LineItem::debit("1120", "Utilities Receivable", AccountType::Asset, 100_00),
                LineItem::credit("4000", "Rent Income", AccountType::Income, 100_00),
            ],
        ));
        let aggregator = aggregator_over(store);

        let sheet = aggregator.balance_sheet(date(2026, 1, 31), None).unwrap();

        let codes: Vec<&str> = sheet
            .assets
            .current
            .iter()
            .map(|line| line.account_code.as_str())
            .collect();
        assert_eq!(codes, vec!["1100"]);
        assert_eq!(sheet.assets.current[0].amount, 300_00);
        assert!(sheet.assets.current[0].summary);
        assert_eq!(sheet.assets.current_total, 300_00);
        assert!(sheet.equation.balanced);
    }

    #[test]
    fn opening_balances_respect_the_as_of_date() {
        let mut accounts = chart();
        for account in &mut accounts {
            match account.code.as_str() {
                "1010" => *account = account.clone().with_opening_balance(100_00, date(2026, 1, 1)),
                "3000" => *account = account.clone().with_opening_balance(100_00, date(2026, 1, 1)),
                // Dated after the report: excluded.
                "1110" => *account = account.clone().with_opening_balance(50_00, date(2026, 6, 1)),
                // Undated: excluded with a warning.
                "2100" => account.opening_balance = 30_00,
                _ => {}
            }
        }
        let store = Arc::new(FakeJournal::new());
        let aggregator =
            BalanceSheetAggregator::new(store, Arc::new(FakeCatalog::with(accounts)));

        let sheet = aggregator.balance_sheet(date(2026, 2, 28), None).unwrap();

        assert_eq!(sheet.assets.current_total, 100_00);
        assert_eq!(sheet.equity.capital_total, 100_00);
        assert_eq!(sheet.liabilities.current_total, 0);
        assert!(sheet.equation.balanced);
        match &sheet.warnings[..] {
            [LedgerWarning::UndatedOpeningBalance { account_code }] => {
                assert_eq!(account_code, "2100");
            }
            other => panic!("Expected one undated-opening warning, got {other:?}"),
        }
    }

    #[test]
    fn unbalanced_entries_are_reported_not_dropped() {
        let store = Arc::new(FakeJournal::new());
        let good = capital_injection(date(2026, 1, 10), 100_00);
        let mut value = serde_json::to_value(&good).unwrap();
        value["lines"][0]["debit"] = serde_json::json!(150_00);
        let corrupt: JournalEntry = serde_json::from_value(value).unwrap();
        store.seed(corrupt);
        let aggregator = aggregator_over(store);

        let sheet = aggregator.balance_sheet(date(2026, 12, 31), None).unwrap();

        assert_eq!(sheet.assets.total, 150_00);
        assert_eq!(sheet.equity.total, 100_00);
        assert!(!sheet.equation.balanced);
        assert_eq!(sheet.equation.difference, 50_00);
        assert_eq!(sheet.equation.correction, None);
        assert!(sheet.warnings.iter().any(|w| matches!(
            w,
            LedgerWarning::UnbalancedEntry {
                debit_total: 150_00,
                credit_total: 100_00,
                ..
            }
        )));
    }

    #[test]
    fn equation_correction_is_cosmetic_and_always_flagged() {
        let store = Arc::new(FakeJournal::new());
        let good = capital_injection(date(2026, 1, 10), 100_00);
        let mut value = serde_json::to_value(&good).unwrap();
        value["lines"][0]["debit"] = serde_json::json!(150_00);
        let corrupt: JournalEntry = serde_json::from_value(value).unwrap();
        store.seed(corrupt);
        let aggregator = BalanceSheetAggregator::new(
            store,
            Arc::new(FakeCatalog::with(chart())),
        )
        .with_options(ReportOptions::default().with_equation_correction());

        let sheet = aggregator.balance_sheet(date(2026, 12, 31), None).unwrap();

        assert_eq!(sheet.equation.correction, Some(50_00));
        assert_eq!(sheet.equation.difference, 50_00);
        assert!(!sheet.equation.balanced);
        assert_eq!(sheet.equity.retained_earnings, 50_00);
        assert_eq!(sheet.assets.total, sheet.liabilities.total + sheet.equity.total);
    }

    #[test]
    fn company_scope_accounts_ignore_residence_filters() {
        let here = ResidenceId::new();
        let elsewhere = ResidenceId::new();
        let store = Arc::new(FakeJournal::new());
        store.seed(posted_in(
            date(2026, 1, 5),
            Some(here),
            vec![
                LineItem::debit("1010", "Cash", AccountType::Asset, 100_00),
                LineItem::credit("3000", "Owner Capital", AccountType::Equity, 100_00),
            ],
        ));
        store.seed(posted_in(
            date(2026, 1, 6),
            Some(elsewhere),
            vec![
                LineItem::debit("1010", "Cash", AccountType::Asset, 70_00),
                LineItem::credit("3000", "Owner Capital", AccountType::Equity, 70_00),
            ],
        ));
        // Company-wide purchase recorded under the other residence.
        store.seed(posted_in(
            date(2026, 1, 7),
            Some(elsewhere),
            vec![
                LineItem::debit("1500", "Property", AccountType::Asset, 500_00),
                LineItem::credit("2500", "Long-Term Loan", AccountType::Liability, 500_00),
            ],
        ));
        let aggregator = aggregator_over(store);

        let sheet = aggregator
            .balance_sheet(date(2026, 12, 31), Some(here))
            .unwrap();

        assert_eq!(sheet.assets.current_total, 100_00);
        assert_eq!(sheet.assets.non_current_total, 500_00);
        assert_eq!(sheet.liabilities.non_current_total, 500_00);
        assert_eq!(sheet.equity.capital_total, 100_00);
        assert!(sheet.equation.balanced);
    }

    #[test]
    fn repeated_generation_is_identical() {
        let store = Arc::new(FakeJournal::new());
        store.seed(capital_injection(date(2026, 1, 5), 1_000_00));
        store.seed(rent_accrual(date(2026, 2, 1), 500_00));
        let aggregator = aggregator_over(store);

        let first = aggregator.balance_sheet(date(2026, 6, 30), None).unwrap();
        let second = aggregator.balance_sheet(date(2026, 6, 30), None).unwrap();

        assert_eq!(first, second);
    }

    #[test]
    fn account_balances_lists_nonzero_accounts_in_code_order() {
        let store = Arc::new(FakeJournal::new());
        store.seed(capital_injection(date(2026, 1, 5), 1_000_00));
        store.seed(rent_accrual(date(2026, 2, 1), 500_00));
        let aggregator = aggregator_over(store);

        let listing = aggregator
            .account_balances(date(2026, 12, 31), None)
            .unwrap();

        let codes: Vec<&str> = listing.iter().map(|b| b.account_code.as_str()).collect();
        assert_eq!(codes, vec!["1010", "1110", "3000", "4000"]);
        assert_eq!(listing[0].amount, 1_000_00);
        assert_eq!(listing[3].amount, 500_00);
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        const ACCOUNTS: [(&str, &str, AccountType); 6] = [
            ("1010", "Cash", AccountType::Asset),
            ("1110", "Rent Receivable", AccountType::Asset),
            ("2100", "Accrued Expenses", AccountType::Liability),
            ("3000", "Owner Capital", AccountType::Equity),
            ("4000", "Rent Income", AccountType::Income),
            ("5000", "Maintenance Expense", AccountType::Expense),
        ];

        proptest! {
            #![proptest_config(ProptestConfig { cases: 256, ..ProptestConfig::default() })]

            #[test]
            fn balanced_ledgers_always_satisfy_the_equation(
                postings in prop::collection::vec(
                    (0usize..6, 0usize..6, 1i64..1_000_000i64, 0u64..364),
                    1..40,
                ),
            ) {
                let store = Arc::new(FakeJournal::new());
                for (debit_idx, credit_idx, amount, day_offset) in postings {
                    let (debit_code, debit_name, debit_type) = ACCOUNTS[debit_idx];
                    let (credit_code, credit_name, credit_type) = ACCOUNTS[credit_idx];
                    let on = date(2026, 1, 1) + chrono::Days::new(day_offset);
                    store.seed(posted(
                        on,
                        vec![
                            LineItem::debit(debit_code, debit_name, debit_type, amount),
                            LineItem::credit(credit_code, credit_name, credit_type, amount),
                        ],
                    ));
                }
                let aggregator = aggregator_over(store);

                let sheet = aggregator.balance_sheet(date(2026, 12, 31), None).unwrap();

                prop_assert!(sheet.equation.balanced);
                prop_assert_eq!(sheet.equation.difference, 0);
            }
        }
    }
}
