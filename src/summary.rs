//! Single-pass aggregation of the sales records into the report headline figures.

use std::fmt;

use log::debug;

use crate::number::{NumberFormat, PriceParseError};
use crate::sales::{format_car, Car, SaleRecord};

/// The record currently leading one metric, together with the metric value.
#[derive(Clone, Debug, PartialEq)]
pub struct Leader<T> {
    /// Position of the record in the input sequence.
    pub index: usize,
    pub id: u64,
    pub car: Car,
    pub value: T,
}

/// Units sold across every record of one model year.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct YearSales {
    pub year: i32,
    pub total_sales: u64,
}

/// Headline figures derived from the sales records.
#[derive(Clone, Debug, PartialEq)]
pub struct Summary {
    top_revenue: Leader<f64>,
    top_units: Leader<u64>,
    top_year: YearSales,
    by_year: Vec<YearSales>,
}

impl Summary {
    /// Car with the highest `price * total_sales`.
    pub fn top_revenue(&self) -> &Leader<f64> {
        &self.top_revenue
    }

    /// Car with the highest unit count.
    pub fn top_units(&self) -> &Leader<u64> {
        &self.top_units
    }

    /// Model year with the highest aggregated unit count.
    pub fn top_year(&self) -> YearSales {
        self.top_year
    }

    /// Units sold per model year, in the order each year first appeared.
    pub fn sales_by_year(&self) -> &[YearSales] {
        &self.by_year
    }

    /// The three summary sentences shown in the report and the email body.
    pub fn lines(&self) -> Vec<String> {
        vec![
            format!(
                "The {} generated the most revenue: ${:.2}",
                format_car(&self.top_revenue.car),
                self.top_revenue.value
            ),
            format!(
                "The {} had the most sales: {}",
                format_car(&self.top_units.car),
                self.top_units.value
            ),
            format!(
                "The most popular year was {} with {} sales.",
                self.top_year.year, self.top_year.total_sales
            ),
        ]
    }
}

/// Errors raised while aggregating the sales records.
#[derive(Debug)]
pub enum AggregateError {
    /// There were no records to summarise.
    NoData,
    /// A record's price could not be read.
    Price {
        index: usize,
        id: u64,
        source: PriceParseError,
    },
    /// The units sold in one model year do not fit in a `u64`.
    Overflow { year: i32 },
}

impl fmt::Display for AggregateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoData => write!(f, "No sales records to summarise"),
            Self::Price { index, id, .. } => {
                write!(f, "Invalid price in record {} (id {})", index, id)
            }
            Self::Overflow { year } => write!(f, "Units sold in {} exceed the counter range", year),
        }
    }
}

impl std::error::Error for AggregateError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::NoData | Self::Overflow { .. } => None,
            Self::Price { source, .. } => Some(source),
        }
    }
}

/// Tie-break rule shared by every metric: a candidate only takes the lead when it
/// is strictly greater, so on equal values the earlier record keeps it.
pub fn takes_lead<T: PartialOrd>(candidate: &T, current: &T) -> bool {
    candidate > current
}

fn revenue(record: &SaleRecord, index: usize, format: &NumberFormat) -> Result<f64, AggregateError> {
    let price = format
        .parse_price(&record.price)
        .map_err(|source| AggregateError::Price {
            index,
            id: record.id,
            source,
        })?;
    Ok(price * record.total_sales as f64)
}

fn leader<T>(index: usize, record: &SaleRecord, value: T) -> Leader<T> {
    Leader {
        index,
        id: record.id,
        car: record.car.clone(),
        value,
    }
}

fn add_year_sales(by_year: &mut Vec<YearSales>, year: i32, units: u64) -> Result<(), AggregateError> {
    match by_year.iter_mut().find(|entry| entry.year == year) {
        Some(entry) => {
            entry.total_sales = entry
                .total_sales
                .checked_add(units)
                .ok_or(AggregateError::Overflow { year })?;
        }
        None => by_year.push(YearSales {
            year,
            total_sales: units,
        }),
    }
    Ok(())
}

/// Scans `records` once and returns the revenue leader, the unit-sales leader
/// and the most popular model year.
///
/// Prices are read with `format`, which rejects negative amounts, so every
/// revenue is at least zero. Every metric keeps the first record that reached
/// its maximum. An empty input fails with [`AggregateError::NoData`] and a model
/// year whose units overflow fails with [`AggregateError::Overflow`].
pub fn summarize(records: &[SaleRecord], format: &NumberFormat) -> Result<Summary, AggregateError> {
    let (first, rest) = records.split_first().ok_or(AggregateError::NoData)?;

    let mut top_revenue = leader(0, first, revenue(first, 0, format)?);
    let mut top_units = leader(0, first, first.total_sales);
    let mut by_year = vec![YearSales {
        year: first.car.car_year,
        total_sales: first.total_sales,
    }];

    for (offset, record) in rest.iter().enumerate() {
        let index = offset + 1;
        let item_revenue = revenue(record, index, format)?;

        if takes_lead(&item_revenue, &top_revenue.value) {
            top_revenue = leader(index, record, item_revenue);
        }
        if takes_lead(&record.total_sales, &top_units.value) {
            top_units = leader(index, record, record.total_sales);
        }
        add_year_sales(&mut by_year, record.car.car_year, record.total_sales)?;
    }

    let mut top_year = by_year[0];
    for entry in &by_year[1..] {
        if takes_lead(&entry.total_sales, &top_year.total_sales) {
            top_year = *entry;
        }
    }

    debug!(
        "Summarised {} records across {} model years",
        records.len(),
        by_year.len()
    );

    Ok(Summary {
        top_revenue,
        top_units,
        top_year,
        by_year,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: u64, make: &str, model: &str, year: i32, price: &str, units: u64) -> SaleRecord {
        SaleRecord {
            id,
            car: Car {
                car_make: make.into(),
                car_model: model.into(),
                car_year: year,
            },
            price: price.into(),
            total_sales: units,
        }
    }

    #[test]
    fn civic_and_corolla() {
        let records = vec![
            record(1, "Honda", "Civic", 2020, "$20000.00", 5),
            record(2, "Toyota", "Corolla", 2020, "$18000.00", 10),
        ];
        let summary = summarize(&records, &NumberFormat::en_us()).expect("summary");

        assert_eq!(summary.top_revenue().id, 2);
        assert_eq!(summary.top_revenue().value, 180000.0);
        assert_eq!(summary.top_units().id, 2);
        assert_eq!(summary.top_units().value, 10);
        assert_eq!(
            summary.top_year(),
            YearSales {
                year: 2020,
                total_sales: 15
            }
        );
        assert_eq!(
            summary.lines(),
            vec![
                "The Toyota Corolla (2020) generated the most revenue: $180000.00".to_string(),
                "The Toyota Corolla (2020) had the most sales: 10".to_string(),
                "The most popular year was 2020 with 15 sales.".to_string(),
            ]
        );
    }

    #[test]
    fn empty_input_is_an_error() {
        let err = summarize(&[], &NumberFormat::en_us()).unwrap_err();
        assert!(matches!(err, AggregateError::NoData));
    }

    #[test]
    fn earlier_record_wins_revenue_tie() {
        let records = vec![
            record(1, "Ford", "Focus", 2010, "$100.00", 10),
            record(2, "Kia", "Rio", 2011, "$200.00", 5),
        ];
        let summary = summarize(&records, &NumberFormat::en_us()).expect("summary");
        assert_eq!(summary.top_revenue().id, 1);
        assert_eq!(summary.top_revenue().index, 0);
    }

    #[test]
    fn earlier_record_wins_units_tie() {
        let records = vec![
            record(7, "Ford", "Focus", 2010, "$1.00", 3),
            record(8, "Kia", "Rio", 2011, "$1.00", 9),
            record(9, "Fiat", "Uno", 2012, "$1.00", 9),
        ];
        let summary = summarize(&records, &NumberFormat::en_us()).expect("summary");
        assert_eq!(summary.top_units().id, 8);
    }

    #[test]
    fn first_seen_year_wins_tie() {
        let records = vec![
            record(1, "Ford", "Focus", 2012, "$1.00", 4),
            record(2, "Kia", "Rio", 2009, "$1.00", 6),
            record(3, "Fiat", "Uno", 2012, "$1.00", 2),
        ];
        let summary = summarize(&records, &NumberFormat::en_us()).expect("summary");
        assert_eq!(summary.top_year().year, 2012);
        assert_eq!(summary.top_year().total_sales, 6);
        assert_eq!(
            summary.sales_by_year(),
            &[
                YearSales {
                    year: 2012,
                    total_sales: 6
                },
                YearSales {
                    year: 2009,
                    total_sales: 6
                },
            ]
        );
    }

    #[test]
    fn all_zero_sales_still_produce_a_leader() {
        let records = vec![
            record(1, "Ford", "Focus", 2012, "$10.00", 0),
            record(2, "Kia", "Rio", 2013, "$20.00", 0),
        ];
        let summary = summarize(&records, &NumberFormat::en_us()).expect("summary");
        assert_eq!(summary.top_revenue().id, 1);
        assert_eq!(summary.top_units().id, 1);
        assert_eq!(summary.top_year().year, 2012);
    }

    #[test]
    fn bad_price_reports_record() {
        let records = vec![
            record(1, "Ford", "Focus", 2012, "$10.00", 1),
            record(42, "Kia", "Rio", 2013, "twenty", 1),
        ];
        let err = summarize(&records, &NumberFormat::en_us()).unwrap_err();
        match err {
            AggregateError::Price { index, id, source } => {
                assert_eq!(index, 1);
                assert_eq!(id, 42);
                assert_eq!(source.input(), "twenty");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn locale_changes_revenue() {
        let records = vec![
            record(1, "Ford", "Focus", 2012, "$1.000,50", 2),
            record(2, "Kia", "Rio", 2013, "$999,99", 2),
        ];
        let summary = summarize(&records, &NumberFormat::de_de()).expect("summary");
        assert_eq!(summary.top_revenue().id, 1);
        assert_eq!(summary.top_revenue().value, 2001.0);
        assert!(summarize(&records, &NumberFormat::posix()).is_err());
    }

    #[test]
    fn no_record_strictly_beats_the_leaders() {
        let inputs = vec![
            vec![record(1, "A", "a", 2000, "$5.00", 1)],
            vec![
                record(1, "A", "a", 2000, "$5.00", 1),
                record(2, "B", "b", 2001, "$1.00", 50),
                record(3, "C", "c", 2000, "$30.00", 3),
                record(4, "D", "d", 2002, "$0.50", 60),
            ],
            vec![
                record(1, "A", "a", 1999, "$1,500.00", 40),
                record(2, "B", "b", 1999, "$2,000.00", 30),
                record(3, "C", "c", 2005, "$750.00", 80),
                record(4, "D", "d", 2005, "$60,000.00", 1),
            ],
        ];
        let format = NumberFormat::en_us();

        for records in inputs {
            let summary = summarize(&records, &format).expect("summary");
            for record in &records {
                let price = format.parse_price(&record.price).expect("price");
                assert!(price * record.total_sales as f64 <= summary.top_revenue().value);
                assert!(record.total_sales <= summary.top_units().value);
            }
            for entry in summary.sales_by_year() {
                assert!(entry.total_sales <= summary.top_year().total_sales);
            }
            let units: u64 = summary.sales_by_year().iter().map(|e| e.total_sales).sum();
            assert_eq!(units, records.iter().map(|r| r.total_sales).sum::<u64>());
        }
    }

    #[test]
    fn negative_price_never_leads_revenue() {
        let records = vec![
            record(1, "Ford", "Focus", 2012, "$-1.00", 5),
            record(2, "Kia", "Rio", 2013, "$-2.00", 3),
        ];
        let err = summarize(&records, &NumberFormat::en_us()).unwrap_err();
        assert!(matches!(err, AggregateError::Price { index: 0, id: 1, .. }));
    }

    #[test]
    fn year_total_overflow_is_an_error() {
        let half = u64::MAX / 2 + 1;
        let records = vec![
            record(1, "Ford", "Focus", 2000, "$1.00", half),
            record(2, "Kia", "Rio", 2000, "$1.00", half),
        ];
        let err = summarize(&records, &NumberFormat::en_us()).unwrap_err();
        assert!(matches!(err, AggregateError::Overflow { year: 2000 }));
        assert!(err.to_string().contains("2000"));
    }

    #[test]
    fn large_totals_in_different_years_are_fine() {
        let records = vec![
            record(1, "Ford", "Focus", 2000, "$1.00", u64::MAX),
            record(2, "Kia", "Rio", 2001, "$1.00", u64::MAX),
        ];
        let summary = summarize(&records, &NumberFormat::en_us()).expect("summary");
        assert_eq!(summary.top_year().year, 2000);
        assert_eq!(summary.top_year().total_sales, u64::MAX);
    }

    #[test]
    fn tie_rule_is_strict() {
        assert!(takes_lead(&2, &1));
        assert!(!takes_lead(&1, &1));
        assert!(!takes_lead(&0.5, &1.0));
    }
}
