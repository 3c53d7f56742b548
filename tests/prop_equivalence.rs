//! The in-memory and SQLite evaluators must agree on which records match, in which order, and on
//! the pagination metadata.

mod common;

use chrono::{Days, NaiveDate};
use proptest::prelude::*;
use proptest::sample::{select, subsequence};
use salesquery::backend::{MemoryBackend, SalesBackend, SqliteBackend};
use salesquery::import::DataSource;
use salesquery::query::{
    AgeBucket, Categorical, DateWindow, FilterCriteria, Order, PageRequest, Query, SortField,
    SortSpec,
};
use salesquery::SaleRecord;

fn record_strategy() -> impl Strategy<Value = SaleRecord> {
    (
        ("[aAbBéÉ ]{0,4}", "[0-9]{0,3}"),
        (
            select(vec!["Female", "Male", ""]),
            select(vec!["North", "north", "South", ""]),
            select(vec!["Beauty", "Home", ""]),
            select(vec!["UPI", "Cash", ""]),
        ),
        select(vec!["a, b", "b", "", " a ,,c", "A"]),
        (
            proptest::option::of(prop_oneof![3 => 10i64..70, 1 => any::<i64>()]),
            proptest::option::of(prop_oneof![3 => 0i64..5, 1 => any::<i64>()]),
            proptest::option::of(0i64..40),
            proptest::option::of(0u64..800),
        ),
    )
        .prop_map(|((name, phone), (gender, region, category, payment), tags, (age, qty, amount, day))| {
            SaleRecord {
                customer_name: name,
                phone_number: phone,
                gender: gender.into(),
                customer_region: region.into(),
                product_category: category.into(),
                payment_method: payment.into(),
                tags: tags.into(),
                age,
                quantity: qty,
                // quarter steps keep ties frequent and every value exact in binary
                total_amount: amount.map(|a| a as f64 / 4.0),
                date: day.and_then(|d| NaiveDate::from_ymd_opt(2022, 6, 1)?.checked_add_days(Days::new(d))),
                ..SaleRecord::default()
            }
        })
}

fn dataset_strategy() -> impl Strategy<Value = Vec<SaleRecord>> {
    proptest::collection::vec(record_strategy(), 0..40).prop_map(|mut v| {
        for (i, r) in v.iter_mut().enumerate() {
            r.transaction_id = format!("T{i:03}");
            r.customer_id = format!("C{}", (i * 7) % 5);
        }
        v
    })
}

fn criteria_strategy() -> impl Strategy<Value = FilterCriteria> {
    (
        proptest::option::of("[aAé0-9]{1,2}"),
        subsequence(vec!["Female", "Male"], 0..=2),
        subsequence(vec!["North", "north", "South"], 0..=2),
        subsequence(vec!["Beauty", "beauty", "Home"], 0..=2),
        subsequence(vec!["UPI", "Cash", "Card"], 0..=2),
        subsequence(AgeBucket::ALL.to_vec(), 0..=2),
        subsequence(vec!["a", "b", "c", "A"], 0..=2),
        proptest::option::of(select(DateWindow::ALL.to_vec())),
    )
        .prop_map(|(search, genders, regions, categories, payments, ages, tags, window)| {
            let mut b = FilterCriteria::builder()
                .any_of(Categorical::Gender, genders)
                .any_of(Categorical::CustomerRegion, regions)
                .any_of(Categorical::ProductCategory, categories)
                .any_of(Categorical::PaymentMethod, payments)
                .age_buckets(ages)
                .tags(tags)
                .date_window(window);
            if let Some(s) = search {
                b = b.search(s);
            }
            b.build()
        })
}

fn query_strategy() -> impl Strategy<Value = Query> {
    (
        criteria_strategy(),
        select(SortField::ALL.to_vec()),
        prop_oneof![Just(Order::Asc), Just(Order::Desc)],
        1usize..5,
        1usize..8,
    )
        .prop_map(|(criteria, field, order, page, limit)| Query {
            criteria,
            sort: SortSpec { field, order },
            page: PageRequest::new(page, limit),
            as_of: common::today(),
        })
}

fn run_both(records: Vec<SaleRecord>, query: &Query) -> (Vec<String>, Vec<String>, bool) {
    let rt = tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap();
    rt.block_on(async {
        let mem = MemoryBackend::new(DataSource::records(records.clone()));
        let sql = SqliteBackend::in_memory(Some(DataSource::records(records))).await.unwrap();
        mem.load().await.unwrap();
        sql.load().await.unwrap();
        let a = mem.execute(query).await.unwrap();
        let b = sql.execute(query).await.unwrap();
        (common::ids(&a), common::ids(&b), a.pagination == b.pagination)
    })
}

proptest! {
    #![proptest_config(proptest::test_runner::Config {
        failure_persistence: Some(Box::new(proptest::test_runner::FileFailurePersistence::WithSource("proptest-regressions"))),
        cases: 48,
        .. proptest::test_runner::Config::default()
    })]

    #[test]
    fn prop_backends_return_identical_pages(records in dataset_strategy(), query in query_strategy()) {
        let (mem, sql, same_pagination) = run_both(records, &query);
        prop_assert_eq!(mem, sql);
        prop_assert!(same_pagination);
    }

    #[test]
    fn prop_backends_agree_on_full_match_set(records in dataset_strategy(), criteria in criteria_strategy()) {
        let query = Query {
            criteria,
            sort: SortSpec::default(),
            page: PageRequest::new(1, 1000),
            as_of: common::today(),
        };
        let mut expected: Vec<String> = records
            .iter()
            .filter(|r| salesquery::query::matches(r, &query.criteria, query.as_of))
            .map(|r| r.transaction_id.clone())
            .collect();
        let (mut mem, mut sql, _) = run_both(records, &query);
        expected.sort();
        mem.sort();
        sql.sort();
        prop_assert_eq!(&mem, &expected);
        prop_assert_eq!(&sql, &expected);
    }
}
