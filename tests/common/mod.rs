#![allow(dead_code)]

use chrono::{DateTime, Duration, Utc};
use repokit::model::User;
use repokit::{Model, RepoError, Value};

pub fn at(text: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(text).unwrap().with_timezone(&Utc)
}

/// Fixed "now" used by the shared suite.
pub fn base_time() -> DateTime<Utc> {
    at("2012-11-01T12:00:00Z")
}

pub fn days_ago(days: i64) -> DateTime<Utc> {
    base_time() - Duration::days(days)
}

/// Order-insensitive view of a result set.
pub fn unordered(users: &[User]) -> Vec<String> {
    let mut out: Vec<String> = users.iter().map(|u| format!("{:?}", u.to_attributes())).collect();
    out.sort();
    out
}

pub fn names(users: &[User]) -> Vec<String> {
    users.iter().map(|u| u.name.clone().unwrap_or_default()).collect()
}

/// Narrow domain view of a stored [`User`], for adapters that project results.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Person {
    pub id: Value,
    pub name: Option<String>,
}

impl Model for Person {
    const FIELDS: &'static [&'static str] = &["id", "name"];

    fn get(&self, field: &str) -> Option<Value> {
        match field {
            "id" => Some(self.id.clone()),
            "name" => Some(self.name.clone().into()),
            _ => None,
        }
    }

    fn set(&mut self, field: &str, value: Value) -> repokit::Result<()> {
        match (field, value) {
            ("id", id) => self.id = id,
            ("name", Value::Null) => self.name = None,
            ("name", Value::Text(name)) => self.name = Some(name),
            (other, value) => return Err(RepoError::Model(format!("{other} cannot hold {}", value.inspect()))),
        }
        Ok(())
    }
}

/// One behavioural suite for every backend.
///
/// Takes the adapter type over [`User`] and the same adapter projecting into [`Person`];
/// each closure builds a repository from the test clock.
#[macro_export]
macro_rules! repository_examples {
    ($adapter:ty, |$clock:ident| $make:expr; $projected:ty, |$pclock:ident| $pmake:expr) => {
        mod repository_examples {
            #[allow(unused_imports)]
            use super::*;
            use std::sync::Arc;

            use $crate::common::{Person, base_time, days_ago, names, unordered};
            use chrono::Duration;
            use repokit::model::{Clock, FixedClock, User};
            use repokit::{attrs, Attributes, Model, RepoError, Repository, Value};

            fn build($clock: Arc<dyn Clock>) -> Repository<$adapter> {
                $make
            }

            fn build_people($pclock: Arc<dyn Clock>) -> Repository<$projected> {
                $pmake
            }

            fn people() -> (Repository<$projected>, Arc<FixedClock>) {
                let clock = Arc::new(FixedClock::new(base_time()));
                (build_people(clock.clone()), clock)
            }

            fn fresh() -> (Repository<$adapter>, Arc<FixedClock>) {
                let clock = Arc::new(FixedClock::new(base_time()));
                (build(clock.clone()), clock)
            }

            fn repo() -> Repository<$adapter> {
                fresh().0
            }

            fn opened(repo: &Repository<$adapter>) -> [User; 3] {
                [5, 3, 1].map(|d| repo.create(attrs! { "opened_at" => days_ago(d) }).unwrap())
            }

            fn seven(repo: &Repository<$adapter>) {
                let rows = [
                    (1, "one"),
                    (12, "twelve"),
                    (23, "twenty3"),
                    (34, "thirty4"),
                    (45, "forty5"),
                    (1, "the one"),
                    (44, "forty4"),
                ];
                for (age, name) in rows {
                    repo.create(attrs! { "age" => age, "name" => name }).unwrap();
                }
            }

            fn found(repo: &Repository<$adapter>, user: &User) -> Attributes {
                repo.find_by_id(user.id()).unwrap().unwrap().to_attributes()
            }

            // create

            #[test]
            fn creates_an_empty_record() {
                let repo = repo();
                let created = repo.create(Attributes::new()).unwrap();
                assert!(!created.id().is_null());
                assert_eq!(found(&repo, &created), created.to_attributes());
            }

            #[test]
            fn creates_from_attributes() {
                let repo = repo();
                let created = repo.create(attrs! { "name" => "John" }).unwrap();
                assert_eq!(created.name.as_deref(), Some("John"));
                assert_eq!(found(&repo, &created), created.to_attributes());
            }

            #[test]
            fn creates_from_a_model() {
                let repo = repo();
                let created = repo.create_model(&User::named("John")).unwrap();
                assert_eq!(created.name.as_deref(), Some("John"));
                assert_eq!(found(&repo, &created), created.to_attributes());
            }

            #[test]
            fn create_ignores_a_given_identity() {
                let repo = repo();
                let first = repo.create(attrs! { "name" => "a" }).unwrap();
                let second = repo.create(attrs! { "id" => first.id(), "name" => "b" }).unwrap();
                assert_ne!(first.id(), second.id());
                assert_eq!(repo.count().unwrap(), 2);
            }

            #[test]
            fn create_assigns_timestamps() {
                let repo = repo();
                let created = repo.create(Attributes::new()).unwrap();
                assert_eq!(created.created_at, Some(base_time()));
                assert_eq!(created.updated_at, Some(base_time()));
            }

            #[test]
            fn create_rejects_unknown_attributes() {
                let err = repo().create(attrs! { "nick" => "j" }).unwrap_err();
                assert_eq!(err.to_string(), "Unknown attribute: nick");
            }

            // update

            #[test]
            fn updates_with_attributes() {
                let repo = repo();
                let created = repo.create(attrs! { "name" => "John" }).unwrap();
                let updated = repo.update(&created, attrs! { "name" => "Steve" }).unwrap();
                assert_ne!(created, updated);
                assert_eq!(updated.name.as_deref(), Some("Steve"));
                assert_eq!(found(&repo, &updated), updated.to_attributes());
            }

            #[test]
            fn updates_with_no_attributes() {
                let repo = repo();
                let created = repo.create(attrs! { "name" => "John" }).unwrap();
                let updated = repo.update(&created, Attributes::new()).unwrap();
                assert_eq!(updated.name.as_deref(), Some("John"));
                assert_eq!(found(&repo, &updated), updated.to_attributes());
            }

            #[test]
            fn updates_from_the_model() {
                let repo = repo();
                let created = repo.create(attrs! { "name" => "John" }).unwrap();
                let mut changed = created.clone();
                changed.name = Some("Steve".into());
                let updated = repo.update(&changed, Attributes::new()).unwrap();
                assert_ne!(created, updated);
                assert_eq!(updated.name.as_deref(), Some("Steve"));
                assert_eq!(found(&repo, &updated), updated.to_attributes());
            }

            #[test]
            fn update_by_id_merges_attributes() {
                let repo = repo();
                let created = repo.create(attrs! { "name" => "John", "age" => 30 }).unwrap();
                let updated = repo.update_by_id(created.id(), attrs! { "age" => 31 }).unwrap();
                assert_eq!(updated.name.as_deref(), Some("John"));
                assert_eq!(updated.age, Some(31));
            }

            #[test]
            fn update_ignores_identity_changes() {
                let repo = repo();
                let created = repo.create(Attributes::new()).unwrap();
                let updated = repo.update(&created, attrs! { "id" => "something_else" }).unwrap();
                assert_eq!(updated.to_attributes(), created.to_attributes());
                assert_eq!(found(&repo, &updated), updated.to_attributes());
            }

            #[test]
            fn update_stamps_updated_at_from_the_clock() {
                let (repo, clock) = fresh();
                let created = repo.create(Attributes::new()).unwrap();
                clock.advance(Duration::days(1));
                let updated = repo.update(&created, Attributes::new()).unwrap();
                let stored = repo.find_by_id(updated.id()).unwrap().unwrap();
                assert_eq!(stored, updated);
                assert_eq!(stored.created_at, Some(base_time()));
                assert_eq!(stored.updated_at, Some(base_time() + Duration::days(1)));
            }

            #[test]
            fn update_of_a_missing_record_fails() {
                let mut ghost = User::named("Sally");
                ghost.id = Value::Int(1);
                let err = repo().update(&ghost, Attributes::new()).unwrap_err();
                assert!(matches!(err, RepoError::NotFound { .. }));
                assert_eq!(err.to_string(), "Could not update record with id: 1 because it does not exist");
            }

            // remove

            #[test]
            fn removes_a_record() {
                let repo = repo();
                let a = repo.create(Attributes::new()).unwrap();
                let b = repo.create(Attributes::new()).unwrap();
                repo.remove(&a).unwrap();
                assert!(repo.find_by_id(a.id()).unwrap().is_none());
                assert_eq!(found(&repo, &b), b.to_attributes());
            }

            #[test]
            fn remove_of_a_missing_record_fails() {
                let mut ghost = User::named("Sally");
                ghost.id = Value::Int(1);
                let err = repo().remove(&ghost).unwrap_err();
                assert_eq!(err.to_string(), "Could not remove record with id: 1 because it does not exist");
            }

            #[test]
            fn removes_by_id() {
                let repo = repo();
                let a = repo.create(Attributes::new()).unwrap();
                let b = repo.create(Attributes::new()).unwrap();
                repo.remove_by_id(a.id()).unwrap();
                assert!(repo.find_by_id(a.id()).unwrap().is_none());
                assert_eq!(found(&repo, &b), b.to_attributes());
                let err = repo.remove_by_id(a.id()).unwrap_err();
                assert_eq!(err.missing_id(), Some(&a.id()));
            }

            #[test]
            fn remove_by_unknown_id_fails() {
                let err = repo().remove_by_id(1).unwrap_err();
                assert_eq!(err.to_string(), "Could not remove record with id: 1 because it does not exist");
            }

            #[test]
            fn find_by_unknown_id_is_none() {
                let repo = repo();
                repo.create(Attributes::new()).unwrap();
                assert!(repo.find_by_id("unknown").unwrap().is_none());
                assert!(repo.find_by_id(987_654).unwrap().is_none());
            }

            // filtering

            #[test]
            fn empty_repository_has_no_records() {
                let repo = repo();
                assert!(repo.all().unwrap().is_empty());
                assert_eq!(repo.count().unwrap(), 0);
                assert!(repo.first().unwrap().is_none());
                assert!(repo.last().unwrap().is_none());
            }

            #[test]
            fn all_count_and_remove_all() {
                let repo = repo();
                let a = repo.create(attrs! { "name" => "Steve" }).unwrap();
                let b = repo.create(attrs! { "name" => "John" }).unwrap();
                assert_eq!(unordered(&repo.all().unwrap()), unordered(&[a, b]));
                assert_eq!(repo.count().unwrap(), 2);
                repo.remove_all().unwrap();
                assert!(repo.all().unwrap().is_empty());
            }

            #[test]
            fn filters_on_equality() {
                let repo = repo();
                let steve = repo.create(attrs! { "name" => "Steve" }).unwrap();
                let john = repo.create(attrs! { "name" => "John" }).unwrap();
                assert_eq!(repo.eq("name", "Steve").unwrap().all().unwrap(), vec![steve]);
                assert_eq!(repo.eq("name", "Steve").unwrap().count().unwrap(), 1);
                assert_eq!(repo.eq("name", "John").unwrap().all().unwrap(), vec![john]);
                repo.eq("name", "John").unwrap().remove().unwrap();
                assert_eq!(repo.eq("name", "John").unwrap().count().unwrap(), 0);
                assert_eq!(repo.count().unwrap(), 1);
            }

            #[test]
            fn filters_on_null_equality() {
                let repo = repo();
                let nameless = repo.create(attrs! { "name" => Value::Null }).unwrap();
                let john = repo.create(attrs! { "name" => "John" }).unwrap();
                assert_eq!(repo.eq("name", Value::Null).unwrap().all().unwrap(), vec![nameless]);
                assert_eq!(repo.eq("name", None::<String>).unwrap().count().unwrap(), 1);
                assert_eq!(repo.eq("name", "John").unwrap().all().unwrap(), vec![john]);
            }

            #[test]
            fn filters_on_inequality() {
                let repo = repo();
                let steve = repo.create(attrs! { "name" => "Steve" }).unwrap();
                let john = repo.create(attrs! { "name" => "John" }).unwrap();
                assert_eq!(repo.not_eq("name", "Steve").unwrap().all().unwrap(), vec![john]);
                assert_eq!(repo.not_eq("name", "John").unwrap().all().unwrap(), vec![steve]);
                repo.not_eq("name", "John").unwrap().remove().unwrap();
                assert_eq!(repo.not_eq("name", "John").unwrap().count().unwrap(), 0);
            }

            #[test]
            fn filters_on_null_inequality() {
                let repo = repo();
                let nameless = repo.create(attrs! { "name" => Value::Null }).unwrap();
                let john = repo.create(attrs! { "name" => "John" }).unwrap();
                assert_eq!(repo.not_eq("name", Value::Null).unwrap().all().unwrap(), vec![john]);
                assert_eq!(repo.not_eq("name", Value::Null).unwrap().count().unwrap(), 1);
                assert_eq!(repo.not_eq("name", "John").unwrap().all().unwrap(), vec![nameless]);
                assert_eq!(repo.not_eq("name", "John").unwrap().count().unwrap(), 1);
            }

            #[test]
            fn rejects_bad_field_names() {
                let repo = repo();
                for bad in ["", "1st", "na me"] {
                    let msg = repo.eq(bad, "x").err().unwrap().to_string();
                    assert!(msg.starts_with("Field name must be a non-empty identifier"), "{msg}");
                    assert!(repo.not_eq(bad, "x").is_err());
                    assert!(repo.lt(bad, 1).is_err());
                    assert!(repo.lte(bad, 1).is_err());
                    assert!(repo.gt(bad, 1).is_err());
                    assert!(repo.gte(bad, 1).is_err());
                    assert!(repo.in_(bad, [1]).is_err());
                    assert!(repo.not_in(bad, [1]).is_err());
                    assert!(repo.sort(bad, "asc").is_err());
                }
            }

            #[test]
            fn filters_on_less_than() {
                let repo = repo();
                let a = repo.create(attrs! { "age" => 18 }).unwrap();
                let b = repo.create(attrs! { "age" => 25 }).unwrap();
                assert!(repo.lt("age", 18).unwrap().all().unwrap().is_empty());
                assert_eq!(repo.lt("age", 19).unwrap().all().unwrap(), vec![a.clone()]);
                assert_eq!(repo.lt("age", 25).unwrap().count().unwrap(), 1);
                assert_eq!(unordered(&repo.lt("age", 26).unwrap().all().unwrap()), unordered(&[a, b]));
                repo.lt("age", 26).unwrap().remove().unwrap();
                assert_eq!(repo.lt("age", 26).unwrap().count().unwrap(), 0);
            }

            #[test]
            fn filters_on_less_than_or_equal() {
                let repo = repo();
                let a = repo.create(attrs! { "age" => 18 }).unwrap();
                let b = repo.create(attrs! { "age" => 25 }).unwrap();
                assert_eq!(repo.lte("age", 17).unwrap().count().unwrap(), 0);
                assert_eq!(repo.lte("age", 18).unwrap().all().unwrap(), vec![a.clone()]);
                assert_eq!(unordered(&repo.lte("age", 25).unwrap().all().unwrap()), unordered(&[a, b]));
                repo.lte("age", 26).unwrap().remove().unwrap();
                assert_eq!(repo.count().unwrap(), 0);
            }

            #[test]
            fn filters_on_greater_than() {
                let repo = repo();
                let a = repo.create(attrs! { "age" => 18 }).unwrap();
                let b = repo.create(attrs! { "age" => 25 }).unwrap();
                assert_eq!(repo.gt("age", 25).unwrap().count().unwrap(), 0);
                assert_eq!(repo.gt("age", 18).unwrap().all().unwrap(), vec![b.clone()]);
                assert_eq!(unordered(&repo.gt("age", 17).unwrap().all().unwrap()), unordered(&[a, b]));
                repo.gt("age", 17).unwrap().remove().unwrap();
                assert_eq!(repo.count().unwrap(), 0);
            }

            #[test]
            fn filters_on_greater_than_or_equal() {
                let repo = repo();
                let a = repo.create(attrs! { "age" => 18 }).unwrap();
                let b = repo.create(attrs! { "age" => 25 }).unwrap();
                assert_eq!(repo.gte("age", 26).unwrap().count().unwrap(), 0);
                assert_eq!(repo.gte("age", 25).unwrap().all().unwrap(), vec![b.clone()]);
                assert_eq!(unordered(&repo.gte("age", 18).unwrap().all().unwrap()), unordered(&[a, b]));
            }

            #[test]
            fn ordering_filters_skip_nulls_and_reject_null_bounds() {
                let repo = repo();
                repo.create(attrs! { "age" => Value::Null }).unwrap();
                let aged = repo.create(attrs! { "age" => 18 }).unwrap();
                assert_eq!(repo.lt("age", 19).unwrap().all().unwrap(), vec![aged.clone()]);
                assert_eq!(repo.lte("age", 18).unwrap().all().unwrap(), vec![aged.clone()]);
                assert_eq!(repo.gt("age", 17).unwrap().all().unwrap(), vec![aged.clone()]);
                assert_eq!(repo.gte("age", 18).unwrap().all().unwrap(), vec![aged]);
                let messages = [
                    (repo.lt("age", Value::Null).err(), "Less than filter value cannot be null"),
                    (repo.lte("age", Value::Null).err(), "Less than or equal to filter value cannot be null"),
                    (repo.gt("age", Value::Null).err(), "Greater than filter value cannot be null"),
                    (repo.gte("age", Value::Null).err(), "Greater than or equal to filter value cannot be null"),
                ];
                for (err, msg) in messages {
                    assert_eq!(err.unwrap().to_string(), msg);
                }
            }

            #[test]
            fn filters_on_inclusion() {
                let repo = repo();
                let a = repo.create(attrs! { "age" => 18 }).unwrap();
                let b = repo.create(attrs! { "age" => 25 }).unwrap();
                assert!(repo.in_("age", Vec::<i64>::new()).unwrap().all().unwrap().is_empty());
                assert!(repo.in_("age", [30]).unwrap().all().unwrap().is_empty());
                assert_eq!(repo.in_("age", [18]).unwrap().all().unwrap(), vec![a.clone()]);
                assert_eq!(repo.in_("age", [25]).unwrap().count().unwrap(), 1);
                assert_eq!(unordered(&repo.in_("age", [18, 25, 30]).unwrap().all().unwrap()), unordered(&[a, b]));
                repo.in_("age", [18, 25, 30]).unwrap().remove().unwrap();
                assert_eq!(repo.count().unwrap(), 0);
            }

            #[test]
            fn filters_on_inclusion_with_null() {
                let repo = repo();
                let a = repo.create(attrs! { "age" => Value::Null }).unwrap();
                let b = repo.create(attrs! { "age" => 18 }).unwrap();
                let c = repo.create(attrs! { "name" => "Steve" }).unwrap();
                let nulls = repo.in_("age", vec![Value::Null]).unwrap();
                assert_eq!(unordered(&nulls.all().unwrap()), unordered(&[a.clone(), c.clone()]));
                assert_eq!(nulls.count().unwrap(), 2);
                assert_eq!(repo.in_("age", [18]).unwrap().all().unwrap(), vec![b.clone()]);
                let either = repo.in_("age", vec![Value::Null, Value::Int(18)]).unwrap();
                assert_eq!(unordered(&either.all().unwrap()), unordered(&[a, b, c.clone()]));
                assert_eq!(either.count().unwrap(), 3);
                assert_eq!(repo.in_("name", ["Steve"]).unwrap().all().unwrap(), vec![c]);
            }

            #[test]
            fn inclusion_takes_ranges_and_rejects_scalars() {
                let repo = repo();
                repo.create(attrs! { "age" => Value::Null }).unwrap();
                let b = repo.create(attrs! { "age" => 18 }).unwrap();
                repo.create(attrs! { "name" => "Steve" }).unwrap();
                assert_eq!(repo.in_("age", 1..=20i64).unwrap().all().unwrap(), vec![b]);
                let err = repo.in_("age", 19).err().unwrap();
                assert_eq!(err.to_string(), "Inclusion filter value must be a sequence but you gave 19");
            }

            #[test]
            fn filters_on_exclusion() {
                let repo = repo();
                let a = repo.create(attrs! { "age" => 18 }).unwrap();
                let b = repo.create(attrs! { "age" => 25 }).unwrap();
                let c = repo.create(attrs! { "name" => "Steve" }).unwrap();
                let everyone = unordered(&[a.clone(), b.clone(), c.clone()]);
                assert_eq!(unordered(&repo.not_in("age", Vec::<i64>::new()).unwrap().all().unwrap()), everyone);
                assert_eq!(repo.not_in("age", Vec::<i64>::new()).unwrap().count().unwrap(), 3);
                assert_eq!(unordered(&repo.not_in("age", [30]).unwrap().all().unwrap()), everyone);
                assert_eq!(unordered(&repo.not_in("age", [25]).unwrap().all().unwrap()), unordered(&[a.clone(), c.clone()]));
                assert_eq!(unordered(&repo.not_in("age", [18]).unwrap().all().unwrap()), unordered(&[b, c.clone()]));
                assert_eq!(repo.not_in("age", [18, 25]).unwrap().all().unwrap(), vec![c]);
                let none = repo.not_in("age", [18, 25, 30]).unwrap().not_in("name", ["Steve"]).unwrap();
                assert!(none.all().unwrap().is_empty());
                repo.not_in("age", [18]).unwrap().remove().unwrap();
                assert_eq!(repo.not_in("age", [18]).unwrap().count().unwrap(), 0);
                assert_eq!(repo.all().unwrap(), vec![a]);
            }

            #[test]
            fn filters_on_exclusion_with_null() {
                let repo = repo();
                let a = repo.create(attrs! { "age" => Value::Null }).unwrap();
                let b = repo.create(attrs! { "age" => 18 }).unwrap();
                let c = repo.create(attrs! { "name" => "Steve" }).unwrap();
                assert_eq!(repo.not_in("age", vec![Value::Null]).unwrap().all().unwrap(), vec![b.clone()]);
                assert_eq!(unordered(&repo.not_in("age", [18]).unwrap().all().unwrap()), unordered(&[a.clone(), c]));
                assert!(repo.not_in("age", vec![Value::Null, Value::Int(18)]).unwrap().all().unwrap().is_empty());
                assert_eq!(unordered(&repo.not_in("name", ["Steve"]).unwrap().all().unwrap()), unordered(&[a, b]));
            }

            #[test]
            fn exclusion_takes_ranges_and_rejects_scalars() {
                let repo = repo();
                let a = repo.create(attrs! { "age" => Value::Null }).unwrap();
                repo.create(attrs! { "age" => 18 }).unwrap();
                let c = repo.create(attrs! { "name" => "Steve" }).unwrap();
                assert_eq!(unordered(&repo.not_in("age", 1..=20i64).unwrap().all().unwrap()), unordered(&[a, c]));
                let err = repo.not_in("age", 19).err().unwrap();
                assert_eq!(err.to_string(), "Exclusion filter value must be a sequence but you gave 19");
            }

            #[test]
            fn like_matches_substrings_case_insensitively() {
                let repo = repo();
                let john = repo.create(attrs! { "name" => "John Smith" }).unwrap();
                repo.create(attrs! { "name" => "Steve" }).unwrap();
                repo.create(attrs! { "name" => Value::Null }).unwrap();
                assert_eq!(repo.like("name", "smi").unwrap().all().unwrap(), vec![john.clone()]);
                assert_eq!(repo.like("name", "JOHN").unwrap().all().unwrap(), vec![john]);
                assert_eq!(repo.like("name", "%").unwrap().count().unwrap(), 0);
                assert!(repo.like("name", 3).is_err());
            }

            #[test]
            fn or_combines_alternatives() {
                use repokit::FilterFactory as F;
                let repo = repo();
                let a = repo.create(attrs! { "name" => "a", "age" => 10 }).unwrap();
                repo.create(attrs! { "name" => "b", "age" => 20 }).unwrap();
                let c = repo.create(attrs! { "name" => "c", "age" => 30 }).unwrap();
                let cursor = repo
                    .find()
                    .or([F::lt("age", 15).unwrap(), F::eq("name", "c").unwrap()]);
                assert_eq!(unordered(&cursor.all().unwrap()), unordered(&[a, c]));
                assert_eq!(repo.find().or([]).count().unwrap(), 0);
            }

            #[test]
            fn unknown_fields_read_as_null() {
                let repo = repo();
                repo.create(attrs! { "name" => "nick" }).unwrap();
                repo.create(attrs! { "name" => "other" }).unwrap();
                assert_eq!(repo.eq("nick", "nick").unwrap().count().unwrap(), 0);
                assert_eq!(repo.not_eq("nick", Value::Null).unwrap().count().unwrap(), 0);
                assert_eq!(repo.gt("nick", 1).unwrap().count().unwrap(), 0);
                assert_eq!(repo.like("nick", "n").unwrap().count().unwrap(), 0);
                assert_eq!(repo.eq("nick", Value::Null).unwrap().count().unwrap(), 2);
                assert_eq!(repo.not_eq("nick", "nick").unwrap().count().unwrap(), 2);
                assert_eq!(repo.in_("nick", vec![Value::Null]).unwrap().count().unwrap(), 2);
                assert_eq!(repo.not_in("nick", vec!["nick"]).unwrap().count().unwrap(), 2);
                assert_eq!(repo.sort("nick", "desc").unwrap().all().unwrap().len(), 2);
                repo.eq("nick", "nick").unwrap().remove().unwrap();
                assert_eq!(repo.count().unwrap(), 2);
            }

            #[test]
            fn values_of_another_kind_never_match() {
                let repo = repo();
                repo.create(attrs! { "name" => "18", "age" => 18, "active" => true, "opened_at" => base_time() })
                    .unwrap();
                assert_eq!(repo.eq("age", "18").unwrap().count().unwrap(), 0);
                assert_eq!(repo.lt("age", "19").unwrap().count().unwrap(), 0);
                assert_eq!(repo.in_("age", vec!["18"]).unwrap().count().unwrap(), 0);
                assert_eq!(repo.eq("name", 18).unwrap().count().unwrap(), 0);
                assert_eq!(repo.eq("active", 1).unwrap().count().unwrap(), 0);
                assert_eq!(repo.gte("opened_at", "2000").unwrap().count().unwrap(), 0);
                assert_eq!(repo.like("opened_at", "2012").unwrap().count().unwrap(), 0);
                assert_eq!(repo.not_eq("age", "18").unwrap().count().unwrap(), 1);
                assert_eq!(repo.not_in("active", vec![1]).unwrap().count().unwrap(), 1);
                assert_eq!(repo.eq("age", 18.0).unwrap().count().unwrap(), 1);
                assert_eq!(repo.eq("active", true).unwrap().count().unwrap(), 1);
            }

            #[test]
            fn like_folds_non_ascii_case() {
                let repo = repo();
                let emile = repo.create(attrs! { "name" => "Émile Zola" }).unwrap();
                repo.create(attrs! { "name" => "Emile" }).unwrap();
                assert_eq!(repo.like("name", "émile").unwrap().all().unwrap(), vec![emile.clone()]);
                assert_eq!(repo.like("name", "ÉMILE ZOLA").unwrap().all().unwrap(), vec![emile]);
            }

            // first / last

            #[test]
            fn first_honours_filters() {
                let repo = repo();
                let steve = repo.create(attrs! { "name" => "Steve" }).unwrap();
                repo.create(attrs! { "name" => "John" }).unwrap();
                assert_eq!(repo.eq("name", "Steve").unwrap().first().unwrap(), Some(steve));
            }

            #[test]
            fn first_defaults_to_earliest_created() {
                let (repo, clock) = fresh();
                clock.set(days_ago(10));
                let steve = repo.create(attrs! { "name" => "Steve" }).unwrap();
                clock.set(days_ago(5));
                let john = repo.create(attrs! { "name" => "John" }).unwrap();
                assert_eq!(repo.first().unwrap(), Some(steve));
                assert_eq!(repo.last().unwrap(), Some(john));
            }

            #[test]
            fn last_defaults_to_most_recently_created() {
                let (repo, clock) = fresh();
                clock.set(days_ago(5));
                let steve = repo.create(attrs! { "name" => "Steve" }).unwrap();
                clock.set(days_ago(10));
                let john = repo.create(attrs! { "name" => "John" }).unwrap();
                assert_eq!(repo.last().unwrap(), Some(steve));
                assert_eq!(repo.first().unwrap(), Some(john));
            }

            #[test]
            fn identical_creation_times_fall_back_to_identity() {
                let repo = repo();
                let a = repo.create(attrs! { "name" => "a" }).unwrap();
                repo.create(attrs! { "name" => "b" }).unwrap();
                let c = repo.create(attrs! { "name" => "c" }).unwrap();
                assert_eq!(repo.first().unwrap(), Some(a));
                assert_eq!(repo.last().unwrap(), Some(c));
            }

            #[test]
            fn last_inverts_every_sort() {
                let repo = repo();
                seven(&repo);
                let cursor = repo.sort("age", "asc").unwrap().sort("name", "asc").unwrap();
                assert_eq!(cursor.first().unwrap().unwrap().name.as_deref(), Some("one"));
                assert_eq!(cursor.last().unwrap().unwrap().name.as_deref(), Some("forty5"));
            }

            // sorting and paging

            #[test]
            fn sorts_records() {
                let repo = repo();
                let [a, b, c] = opened(&repo);
                let asc = vec![a.clone(), b.clone(), c.clone()];
                let desc = vec![c, b, a];
                assert_eq!(repo.sort("opened_at", repokit::Order::Asc).unwrap().all().unwrap(), asc);
                assert_eq!(repo.sort("opened_at", repokit::Order::Desc).unwrap().all().unwrap(), desc);
                assert_eq!(repo.sort("opened_at", "asc").unwrap().all().unwrap(), asc);
                assert_eq!(repo.sort("opened_at", String::from("desc")).unwrap().all().unwrap(), desc);
            }

            #[test]
            fn sorts_on_several_fields() {
                let repo = repo();
                seven(&repo);
                let all = repo.sort("age", "asc").unwrap().sort("name", "asc").unwrap().all().unwrap();
                assert_eq!(names(&all), ["one", "the one", "twelve", "twenty3", "thirty4", "forty4", "forty5"]);
            }

            #[test]
            fn sort_rejects_unknown_orders() {
                let err = repo().sort("name", "whoops").err().unwrap();
                assert_eq!(err.to_string(), "Sort order must be 'asc' or 'desc' but you gave \"whoops\"");
            }

            #[test]
            fn limits() {
                let repo = repo();
                let [a, b, c] = opened(&repo);
                let asc = || repo.sort("opened_at", "asc").unwrap();
                assert_eq!(asc().limit(1).unwrap().all().unwrap(), vec![a.clone()]);
                assert_eq!(asc().limit("1").unwrap().all().unwrap(), vec![a.clone()]);
                assert_eq!(asc().limit(Value::Null).unwrap().all().unwrap(), vec![a, b, c.clone()]);
                assert_eq!(repo.sort("opened_at", "desc").unwrap().limit(1).unwrap().all().unwrap(), vec![c]);
                let err = asc().limit("many").err().unwrap();
                assert_eq!(err.to_string(), "Limit must be an integer but you gave \"many\"");
                assert!(asc().limit(-1).is_err());
            }

            #[test]
            fn offsets() {
                let repo = repo();
                let [a, b, c] = opened(&repo);
                let asc = || repo.sort("opened_at", "asc").unwrap();
                assert_eq!(asc().offset(1).unwrap().all().unwrap(), vec![b.clone(), c.clone()]);
                assert_eq!(asc().offset("1").unwrap().all().unwrap(), vec![b.clone(), c.clone()]);
                assert_eq!(asc().offset(Value::Null).unwrap().all().unwrap(), vec![a.clone(), b.clone(), c]);
                assert_eq!(repo.sort("opened_at", "desc").unwrap().offset(1).unwrap().all().unwrap(), vec![b, a]);
                let err = asc().offset(1.5).err().unwrap();
                assert_eq!(err.to_string(), "Offset must be an integer but you gave 1.5");
            }

            #[test]
            fn limits_and_offsets() {
                let repo = repo();
                let [_, b, _] = opened(&repo);
                let page = |order: &str| {
                    repo.sort("opened_at", order).unwrap().offset(1).unwrap().limit(1).unwrap().all().unwrap()
                };
                assert_eq!(page("asc"), vec![b.clone()]);
                assert_eq!(page("desc"), vec![b]);
            }

            #[test]
            fn count_and_remove_ignore_paging() {
                let repo = repo();
                opened(&repo);
                let cursor = repo.sort("opened_at", "asc").unwrap().limit(1).unwrap().offset(1).unwrap();
                assert_eq!(cursor.all().unwrap().len(), 1);
                assert_eq!(cursor.count().unwrap(), 3);
                cursor.remove().unwrap();
                assert_eq!(repo.count().unwrap(), 0);
            }

            #[test]
            fn compares_timestamps() {
                let repo = repo();
                let now = base_time();
                let yesterday = days_ago(1);
                let older = repo.create(attrs! { "opened_at" => days_ago(2) }).unwrap();
                let y = repo.create(attrs! { "opened_at" => yesterday }).unwrap();
                let n = repo.create(attrs! { "opened_at" => now }).unwrap();

                let after = repo.gt("opened_at", yesterday).unwrap();
                assert_eq!(after.count().unwrap(), 1);
                assert_eq!(after.first().unwrap(), Some(n.clone()));

                let since = repo.gte("opened_at", yesterday).unwrap();
                assert_eq!(unordered(&since.all().unwrap()), unordered(&[y, n]));

                assert_eq!(repo.lt("opened_at", yesterday).unwrap().all().unwrap(), vec![older]);
            }

            // projection into a narrower domain model

            #[test]
            fn projects_records_into_the_domain_model() {
                let (repo, _) = people();
                let created: Person = repo.create(attrs! { "name" => "John", "age" => 30 }).unwrap();
                assert_eq!(created.name.as_deref(), Some("John"));
                assert!(!created.id.is_null());
                assert_eq!(repo.find_by_id(created.id.clone()).unwrap(), Some(created.clone()));
                assert_eq!(repo.eq("age", 30).unwrap().all().unwrap(), vec![created]);
                assert!(repo.find_by_id(987_654).unwrap().is_none());
            }

            #[test]
            fn updates_through_the_domain_model() {
                let (repo, clock) = people();
                let created = repo.create(attrs! { "name" => "John", "age" => 30 }).unwrap();
                let mut renamed = created.clone();
                renamed.name = Some("Steve".into());
                clock.advance(Duration::days(1));
                let updated = repo.update(&renamed, attrs! { "age" => 31 }).unwrap();
                assert_eq!(updated, renamed);
                assert_eq!(repo.eq("age", 31).unwrap().first().unwrap(), Some(renamed));
                assert_eq!(repo.eq("age", 30).unwrap().count().unwrap(), 0);
                assert_eq!(repo.eq("updated_at", base_time() + Duration::days(1)).unwrap().count().unwrap(), 1);
                assert_eq!(repo.eq("created_at", base_time()).unwrap().count().unwrap(), 1);
            }

            #[test]
            fn projected_first_and_last_use_storage_creation_order() {
                let (repo, clock) = people();
                clock.set(days_ago(5));
                let late = repo.create(attrs! { "name" => "late" }).unwrap();
                clock.set(days_ago(10));
                let early = repo.create(attrs! { "name" => "early" }).unwrap();
                assert_eq!(repo.first().unwrap(), Some(early.clone()));
                assert_eq!(repo.last().unwrap(), Some(late.clone()));
                repo.remove(&late).unwrap();
                assert_eq!(repo.all().unwrap(), vec![early]);
            }
        }
    };
}
