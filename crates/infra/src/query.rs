//! # パラメータ化クエリビルダー
//!
//! [`EntityMapping`] から INSERT / SELECT / UPDATE / DELETE 文を組み立てる。
//!
//! - 値は常に `$n` プレースホルダーとしてバインドし、SQL 文字列に埋め込まない
//! - 識別子（テーブル・カラム）は静的な対応表からのみ取得し、ダブルクォートで囲む
//! - 対応表にないカラムを参照すると `build()` が [`InfraError`] を返す
//!
//! ## 使用例
//!
//! ```rust
//! use petstore_infra::{query::InsertBuilder, schema::ARTICLES};
//!
//! let stmt = InsertBuilder::new(&ARTICLES)
//!     .value("oid", uuid::Uuid::now_v7())
//!     .value("title", "A")
//!     .value("body", "B")
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(
//!     stmt.sql(),
//!     r#"INSERT INTO "articles" ("oid", "title", "body") VALUES ($1, $2, $3)"#
//! );
//! ```

use sqlx::{
    Arguments as _,
    FromRow,
    PgConnection,
    Postgres,
    postgres::{PgArguments, PgRow},
};
use uuid::Uuid;

use crate::{error::InfraError, schema::EntityMapping};

/// バインドする値
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SqlValue {
    I64(i64),
    Text(String),
    Uuid(Uuid),
    TextArray(Vec<String>),
}

impl From<i64> for SqlValue {
    fn from(value: i64) -> Self {
        Self::I64(value)
    }
}

impl From<&str> for SqlValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for SqlValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<Uuid> for SqlValue {
    fn from(value: Uuid) -> Self {
        Self::Uuid(value)
    }
}

impl From<Vec<String>> for SqlValue {
    fn from(value: Vec<String>) -> Self {
        Self::TextArray(value)
    }
}

/// 組み立て済みの SQL 文とバインド値
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Statement {
    sql:    String,
    params: Vec<SqlValue>,
}

impl Statement {
    pub fn sql(&self) -> &str {
        &self.sql
    }

    pub fn params(&self) -> &[SqlValue] {
        &self.params
    }

    /// バインド値を sqlx の引数に変換する
    pub fn arguments(&self) -> Result<PgArguments, InfraError> {
        let mut args = PgArguments::default();
        for param in &self.params {
            match param {
                SqlValue::I64(v) => args.add(*v),
                SqlValue::Text(v) => args.add(v.clone()),
                SqlValue::Uuid(v) => args.add(*v),
                SqlValue::TextArray(v) => args.add(v.clone()),
            }
            .map_err(sqlx::Error::Encode)?;
        }
        Ok(args)
    }

    /// 文を実行し、影響を受けた行数を返す
    pub(crate) async fn execute(&self, conn: &mut PgConnection) -> Result<u64, InfraError> {
        let result = sqlx::query_with::<Postgres, _>(&self.sql, self.arguments()?)
            .execute(conn)
            .await?;
        Ok(result.rows_affected())
    }

    /// 0 行または 1 行を取得する
    pub(crate) async fn fetch_optional<O>(
        &self,
        conn: &mut PgConnection,
    ) -> Result<Option<O>, InfraError>
    where
        O: for<'r> FromRow<'r, PgRow> + Send + Unpin,
    {
        Ok(sqlx::query_as_with::<Postgres, O, _>(&self.sql, self.arguments()?)
            .fetch_optional(conn)
            .await?)
    }

    /// すべての行を取得する
    pub(crate) async fn fetch_all<O>(&self, conn: &mut PgConnection) -> Result<Vec<O>, InfraError>
    where
        O: for<'r> FromRow<'r, PgRow> + Send + Unpin,
    {
        Ok(sqlx::query_as_with::<Postgres, O, _>(&self.sql, self.arguments()?)
            .fetch_all(conn)
            .await?)
    }
}

/// 識別子をダブルクォートで囲む
fn quoted(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}

/// `$n` 形式のプレースホルダーを払い出しながらバインド値を積む
#[derive(Debug, Default)]
struct Params(Vec<SqlValue>);

impl Params {
    fn push(&mut self, value: SqlValue) -> String {
        self.0.push(value);
        format!("${}", self.0.len())
    }
}

/// 組み立て中に見つかった誤り（`build()` でまとめて返す）
#[derive(Debug, Default)]
struct Problems(Vec<String>);

impl Problems {
    fn check_column(&mut self, mapping: &EntityMapping, column: &str) {
        if !mapping.has_column(column) {
            self.0.push(format!(
                "{} ({}) に {} カラムは存在しません",
                mapping.entity, mapping.table, column
            ));
        }
    }

    fn push(&mut self, message: String) {
        self.0.push(message);
    }

    fn into_result(self) -> Result<(), InfraError> {
        if self.0.is_empty() {
            Ok(())
        } else {
            Err(InfraError::invalid_input(self.0.join("; ")))
        }
    }
}

// =============================================================================
// 条件
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Op {
    Eq,
    Gt,
    Any,
}

#[derive(Debug)]
struct Condition {
    mapping: &'static EntityMapping,
    column:  String,
    op:      Op,
    value:   SqlValue,
}

impl Condition {
    fn render(&self, qualify: bool, params: &mut Params) -> String {
        let column = if qualify {
            format!("{}.{}", self.mapping.alias, quoted(&self.column))
        } else {
            quoted(&self.column)
        };
        let placeholder = params.push(self.value.clone());
        match self.op {
            Op::Eq => format!("{column} = {placeholder}"),
            Op::Gt => format!("{column} > {placeholder}"),
            Op::Any => format!("{column} = ANY({placeholder})"),
        }
    }
}

fn render_where(conditions: &[Condition], qualify: bool, params: &mut Params) -> String {
    if conditions.is_empty() {
        return String::new();
    }
    let parts: Vec<String> = conditions
        .iter()
        .map(|c| c.render(qualify, params))
        .collect();
    format!(" WHERE {}", parts.join(" AND "))
}

// =============================================================================
// InsertBuilder
// =============================================================================

/// INSERT 文のビルダー
#[derive(Debug)]
pub struct InsertBuilder {
    mapping:    &'static EntityMapping,
    columns:    Vec<String>,
    values:     Vec<SqlValue>,
    do_nothing: bool,
    problems:   Problems,
}

impl InsertBuilder {
    pub fn new(mapping: &'static EntityMapping) -> Self {
        Self {
            mapping,
            columns: Vec::new(),
            values: Vec::new(),
            do_nothing: false,
            problems: Problems::default(),
        }
    }

    /// 挿入するカラムと値を追加する
    ///
    /// サーバー生成カラムと重複したカラムは拒否する。
    pub fn value(mut self, column: &str, value: impl Into<SqlValue>) -> Self {
        self.problems.check_column(self.mapping, column);
        if self.mapping.has_column(column) && !self.mapping.is_writable(column) {
            self.problems.push(format!(
                "{} はサーバー生成カラムのため値を指定できません",
                column
            ));
        }
        if self.columns.iter().any(|c| c == column) {
            self.problems
                .push(format!("{} カラムが重複しています", column));
        }
        self.columns.push(column.to_string());
        self.values.push(value.into());
        self
    }

    /// 一意制約に衝突した場合は何もしない（`ON CONFLICT DO NOTHING`）
    pub fn on_conflict_do_nothing(mut self) -> Self {
        self.do_nothing = true;
        self
    }

    pub fn build(self) -> Result<Statement, InfraError> {
        let mut problems = self.problems;
        if self.columns.is_empty() {
            problems.push(format!("{} への INSERT に値がありません", self.mapping.table));
        }
        problems.into_result()?;

        let mut params = Params::default();
        let columns: Vec<String> = self.columns.iter().map(|c| quoted(c)).collect();
        let placeholders: Vec<String> = self.values.into_iter().map(|v| params.push(v)).collect();

        let mut sql = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            quoted(self.mapping.table),
            columns.join(", "),
            placeholders.join(", ")
        );
        if self.do_nothing {
            sql.push_str(" ON CONFLICT DO NOTHING");
        }

        Ok(Statement {
            sql,
            params: params.0,
        })
    }
}

// =============================================================================
// SelectBuilder
// =============================================================================

/// 並び順
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Order {
    Asc,
    Desc,
}

#[derive(Debug)]
struct Join {
    joined:        &'static EntityMapping,
    joined_column: String,
    target:        &'static EntityMapping,
    target_column: String,
}

/// SELECT 文のビルダー
///
/// 取得カラムは常に起点テーブルの全カラム（対応表の列順）。
/// 結合したテーブルは絞り込みにだけ使う。
#[derive(Debug)]
pub struct SelectBuilder {
    mapping:    &'static EntityMapping,
    joins:      Vec<Join>,
    conditions: Vec<Condition>,
    order:      Vec<(&'static EntityMapping, String, Order)>,
    limit:      Option<i64>,
    distinct:   bool,
    problems:   Problems,
}

impl SelectBuilder {
    pub fn new(mapping: &'static EntityMapping) -> Self {
        Self {
            mapping,
            joins: Vec::new(),
            conditions: Vec::new(),
            order: Vec::new(),
            limit: None,
            distinct: false,
            problems: Problems::default(),
        }
    }

    fn is_in_scope(&self, mapping: &EntityMapping) -> bool {
        std::ptr::eq(self.mapping, mapping) || self.joins.iter().any(|j| std::ptr::eq(j.joined, mapping))
    }

    fn check_scoped_column(&mut self, mapping: &'static EntityMapping, column: &str) {
        if !self.is_in_scope(mapping) {
            self.problems.push(format!(
                "{} はこのクエリの FROM / JOIN に含まれていません",
                mapping.table
            ));
        }
        self.problems.check_column(mapping, column);
    }

    /// `INNER JOIN joined ON joined.joined_column = target.target_column`
    pub fn join(
        mut self,
        joined: &'static EntityMapping,
        joined_column: &str,
        target: &'static EntityMapping,
        target_column: &str,
    ) -> Self {
        self.problems.check_column(joined, joined_column);
        self.check_scoped_column(target, target_column);
        self.joins.push(Join {
            joined,
            joined_column: joined_column.to_string(),
            target,
            target_column: target_column.to_string(),
        });
        self
    }

    /// 重複行を除く（結合で行が増える場合に使う）
    pub fn distinct(mut self) -> Self {
        self.distinct = true;
        self
    }

    fn condition(
        mut self,
        mapping: &'static EntityMapping,
        column: &str,
        op: Op,
        value: SqlValue,
    ) -> Self {
        self.check_scoped_column(mapping, column);
        self.conditions.push(Condition {
            mapping,
            column: column.to_string(),
            op,
            value,
        });
        self
    }

    /// `column = $n`
    pub fn where_eq(
        self,
        mapping: &'static EntityMapping,
        column: &str,
        value: impl Into<SqlValue>,
    ) -> Self {
        self.condition(mapping, column, Op::Eq, value.into())
    }

    /// `column > $n`（キーセットページネーション用）
    pub fn where_gt(
        self,
        mapping: &'static EntityMapping,
        column: &str,
        value: impl Into<SqlValue>,
    ) -> Self {
        self.condition(mapping, column, Op::Gt, value.into())
    }

    /// `column = ANY($n)`
    pub fn where_any(
        self,
        mapping: &'static EntityMapping,
        column: &str,
        values: Vec<String>,
    ) -> Self {
        self.condition(mapping, column, Op::Any, SqlValue::TextArray(values))
    }

    pub fn order_by(mut self, mapping: &'static EntityMapping, column: &str, order: Order) -> Self {
        self.check_scoped_column(mapping, column);
        self.order.push((mapping, column.to_string(), order));
        self
    }

    /// `LIMIT $n`
    pub fn limit(mut self, limit: i64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn build(self) -> Result<Statement, InfraError> {
        self.problems.into_result()?;

        let alias = self.mapping.alias;
        let columns: Vec<String> = self
            .mapping
            .columns
            .iter()
            .map(|c| format!("{alias}.{}", quoted(c)))
            .collect();

        let mut sql = format!(
            "SELECT {}{} FROM {} AS {alias}",
            if self.distinct { "DISTINCT " } else { "" },
            columns.join(", "),
            quoted(self.mapping.table),
        );

        for join in &self.joins {
            sql.push_str(&format!(
                " INNER JOIN {} AS {} ON {}.{} = {}.{}",
                quoted(join.joined.table),
                join.joined.alias,
                join.joined.alias,
                quoted(&join.joined_column),
                join.target.alias,
                quoted(&join.target_column),
            ));
        }

        let mut params = Params::default();
        sql.push_str(&render_where(&self.conditions, true, &mut params));

        if !self.order.is_empty() {
            let parts: Vec<String> = self
                .order
                .iter()
                .map(|(m, c, o)| {
                    let dir = match o {
                        Order::Asc => "ASC",
                        Order::Desc => "DESC",
                    };
                    format!("{}.{} {dir}", m.alias, quoted(c))
                })
                .collect();
            sql.push_str(&format!(" ORDER BY {}", parts.join(", ")));
        }

        if let Some(limit) = self.limit {
            let placeholder = params.push(SqlValue::I64(limit));
            sql.push_str(&format!(" LIMIT {placeholder}"));
        }

        Ok(Statement {
            sql,
            params: params.0,
        })
    }
}

// =============================================================================
// UpdateBuilder
// =============================================================================

#[derive(Debug)]
enum Assignment {
    Value(String, SqlValue),
    /// `column = GREATEST(now(), column)`
    Touch(String),
}

/// UPDATE 文のビルダー
#[derive(Debug)]
pub struct UpdateBuilder {
    mapping:     &'static EntityMapping,
    assignments: Vec<Assignment>,
    conditions:  Vec<Condition>,
    problems:    Problems,
}

impl UpdateBuilder {
    pub fn new(mapping: &'static EntityMapping) -> Self {
        Self {
            mapping,
            assignments: Vec::new(),
            conditions: Vec::new(),
            problems: Problems::default(),
        }
    }

    /// `column = $n`
    ///
    /// 主キー・サーバー生成カラム・作成後に不変なカラム（oid）は拒否する。
    pub fn set(mut self, column: &str, value: impl Into<SqlValue>) -> Self {
        self.problems.check_column(self.mapping, column);
        if self.mapping.has_column(column) && !self.mapping.is_updatable(column) {
            self.problems
                .push(format!("{} カラムは更新できません", column));
        }
        self.assignments
            .push(Assignment::Value(column.to_string(), value.into()));
        self
    }

    /// タイムスタンプを現在時刻に進める（過去には戻さない）
    pub fn touch(mut self, column: &str) -> Self {
        self.problems.check_column(self.mapping, column);
        self.assignments.push(Assignment::Touch(column.to_string()));
        self
    }

    /// `column = $n`
    pub fn where_eq(mut self, column: &str, value: impl Into<SqlValue>) -> Self {
        self.problems.check_column(self.mapping, column);
        self.conditions.push(Condition {
            mapping: self.mapping,
            column:  column.to_string(),
            op:      Op::Eq,
            value:   value.into(),
        });
        self
    }

    pub fn build(self) -> Result<Statement, InfraError> {
        let mut problems = self.problems;
        if self.assignments.is_empty() {
            problems.push(format!("{} への UPDATE に SET 句がありません", self.mapping.table));
        }
        if self.conditions.is_empty() {
            problems.push(format!("{} への UPDATE に WHERE 句がありません", self.mapping.table));
        }
        problems.into_result()?;

        let mut params = Params::default();
        let sets: Vec<String> = self
            .assignments
            .into_iter()
            .map(|a| match a {
                Assignment::Value(column, value) => {
                    format!("{} = {}", quoted(&column), params.push(value))
                }
                Assignment::Touch(column) => {
                    let c = quoted(&column);
                    format!("{c} = GREATEST(now(), {c})")
                }
            })
            .collect();

        let mut sql = format!(
            "UPDATE {} SET {}",
            quoted(self.mapping.table),
            sets.join(", ")
        );
        sql.push_str(&render_where(&self.conditions, false, &mut params));

        Ok(Statement {
            sql,
            params: params.0,
        })
    }
}

// =============================================================================
// DeleteBuilder
// =============================================================================

/// DELETE 文のビルダー
///
/// WHERE 句のない DELETE は組み立てられない。
#[derive(Debug)]
pub struct DeleteBuilder {
    mapping:    &'static EntityMapping,
    conditions: Vec<Condition>,
    problems:   Problems,
}

impl DeleteBuilder {
    pub fn new(mapping: &'static EntityMapping) -> Self {
        Self {
            mapping,
            conditions: Vec::new(),
            problems: Problems::default(),
        }
    }

    /// `column = $n`
    pub fn where_eq(mut self, column: &str, value: impl Into<SqlValue>) -> Self {
        self.problems.check_column(self.mapping, column);
        self.conditions.push(Condition {
            mapping: self.mapping,
            column:  column.to_string(),
            op:      Op::Eq,
            value:   value.into(),
        });
        self
    }

    pub fn build(self) -> Result<Statement, InfraError> {
        let mut problems = self.problems;
        if self.conditions.is_empty() {
            problems.push(format!("{} への DELETE に WHERE 句がありません", self.mapping.table));
        }
        problems.into_result()?;

        let mut params = Params::default();
        let mut sql = format!("DELETE FROM {}", quoted(self.mapping.table));
        sql.push_str(&render_where(&self.conditions, false, &mut params));

        Ok(Statement {
            sql,
            params: params.0,
        })
    }
}
