//! SQLite implementation of the GlossaryRepository
//!
//! Label maps are stored as JSON text. Concepts and collections share the
//! `collection_members` table and are told apart by `member_type`.

use std::collections::HashSet;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use sqlx::{FromRow, SqliteConnection, SqlitePool};
use tracing::{debug, info};

use crate::domain::glossary::{
    CollectionData, CollectionWithMembers, ConceptData, ConceptScheme, ConceptWithSchemes,
    GlossaryRepository, GraphStats, Member, MemberKind, MemberType, ParsedDataset, SaveSummary,
    SchemeWithMembers, SemanticRelation, SemanticRelationType,
};
use crate::error::{Error, Result};
use crate::storage::migrations::recreate_graph_schema;

const SCHEME_COLUMNS: &str = r#"
    cs.iri, cs.notation, cs."scopeNote" AS scope_note, cs."prefLabels" AS pref_labels
"#;

const MEMBER_SELECT: &str = r#"
    SELECT m.iri, m.notation, m."prefLabels" AS pref_labels, m.member_type,
           c.identifier, c."altLabels" AS alt_labels, c."scopeNotes" AS scope_notes
    FROM collection_members m
    LEFT JOIN concepts c ON c.iri = m.iri
"#;

/// SQLite implementation of the glossary repository
#[derive(Clone)]
pub struct SqliteGlossaryRepository {
    pool: SqlitePool,
}

impl SqliteGlossaryRepository {
    /// Create a new SQLite glossary repository
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    async fn insert_scheme(conn: &mut SqliteConnection, scheme: &ConceptScheme) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO concept_schemes (iri, notation, "scopeNote", "prefLabels")
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(&scheme.iri)
        .bind(&scheme.notation)
        .bind(&scheme.scope_note)
        .bind(serde_json::to_string(&scheme.pref_labels)?)
        .execute(&mut *conn)
        .await?;
        Ok(())
    }

    async fn insert_member(conn: &mut SqliteConnection, member: &Member) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO collection_members (iri, notation, "prefLabels", member_type)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(&member.iri)
        .bind(&member.notation)
        .bind(serde_json::to_string(&member.pref_labels)?)
        .bind(member.member_type().as_str())
        .execute(&mut *conn)
        .await?;

        match &member.kind {
            MemberKind::Concept(concept) => {
                sqlx::query(
                    r#"
                    INSERT INTO concepts (iri, identifier, "altLabels", "scopeNotes")
                    VALUES (?, ?, ?, ?)
                    "#,
                )
                .bind(&member.iri)
                .bind(&concept.identifier)
                .bind(serde_json::to_string(&concept.alt_labels)?)
                .bind(serde_json::to_string(&concept.scope_notes)?)
                .execute(&mut *conn)
                .await?;
            }
            MemberKind::Collection(_) => {
                sqlx::query("INSERT INTO collections (iri) VALUES (?)")
                    .bind(&member.iri)
                    .execute(&mut *conn)
                    .await?;
            }
        }
        Ok(())
    }

    async fn member_exists(conn: &mut SqliteConnection, iri: &str) -> Result<bool> {
        let row: Option<(String,)> = sqlx::query_as("SELECT iri FROM collection_members WHERE iri = ?")
            .bind(iri)
            .fetch_optional(&mut *conn)
            .await?;
        Ok(row.is_some())
    }

    async fn fetch_member(&self, iri: &str, member_type: MemberType) -> Result<Option<Member>> {
        let row: Option<MemberRow> =
            sqlx::query_as(&format!("{MEMBER_SELECT} WHERE m.iri = ? AND m.member_type = ?"))
                .bind(iri)
                .bind(member_type.as_str())
                .fetch_optional(&self.pool)
                .await?;

        row.map(|r| r.into_member()).transpose()
    }

    async fn count(&self, table: &str) -> Result<u64> {
        let (count,): (i64,) = sqlx::query_as(&format!("SELECT COUNT(*) FROM {table}"))
            .fetch_one(&self.pool)
            .await?;
        Ok(count as u64)
    }
}

#[async_trait]
impl GlossaryRepository for SqliteGlossaryRepository {
    // ========== Write Operations ==========

    async fn save_dataset(&self, dataset: &ParsedDataset) -> Result<SaveSummary> {
        // Dropping the transaction on any early return rolls it back
        let mut tx = self.pool.begin().await?;
        let mut summary = SaveSummary::default();

        for scheme in &dataset.concept_schemes {
            Self::insert_scheme(&mut tx, scheme).await?;
            summary.concept_schemes += 1;
        }

        for member in dataset.concepts.iter().chain(&dataset.collections) {
            Self::insert_member(&mut tx, member).await?;
            match member.member_type() {
                MemberType::Concept => summary.concepts += 1,
                MemberType::Collection => summary.collections += 1,
            }
        }

        for edge in &dataset.in_schemes {
            let result =
                sqlx::query("INSERT OR IGNORE INTO in_scheme (scheme_iri, member_iri) VALUES (?, ?)")
                    .bind(&edge.scheme_iri)
                    .bind(&edge.member_iri)
                    .execute(&mut *tx)
                    .await?;
            summary.in_scheme += result.rows_affected() as usize;
        }

        for relation in &dataset.semantic_relations {
            let result = sqlx::query(
                r#"
                INSERT OR IGNORE INTO semantic_relations (type, source_concept_iri, target_concept_iri)
                VALUES (?, ?, ?)
                "#,
            )
            .bind(relation.relation_type.as_str())
            .bind(&relation.source_concept_iri)
            .bind(&relation.target_concept_iri)
            .execute(&mut *tx)
            .await?;
            summary.semantic_relations += result.rows_affected() as usize;
        }

        // Resolve collection members once every member of the batch exists
        let batch: HashSet<&str> = dataset
            .concepts
            .iter()
            .chain(&dataset.collections)
            .map(|m| m.iri.as_str())
            .collect();

        for collection in &dataset.collections {
            for member_iri in dataset.collection_targets(collection) {
                let known = batch.contains(member_iri.as_str())
                    || Self::member_exists(&mut tx, &member_iri).await?;
                if !known {
                    debug!(
                        collection_iri = %collection.iri,
                        member_iri = %member_iri,
                        "Collection member not found, skipped"
                    );
                    summary.unresolved_members += 1;
                    continue;
                }

                let result = sqlx::query(
                    "INSERT OR IGNORE INTO in_collection (collection_iri, member_iri) VALUES (?, ?)",
                )
                .bind(&collection.iri)
                .bind(&member_iri)
                .execute(&mut *tx)
                .await?;
                summary.in_collection += result.rows_affected() as usize;
            }
        }

        tx.commit().await?;

        debug!(
            concept_schemes = summary.concept_schemes,
            concepts = summary.concepts,
            collections = summary.collections,
            relations = summary.semantic_relations,
            "Dataset saved"
        );
        Ok(summary)
    }

    async fn reset(&self) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        recreate_graph_schema(&mut tx).await?;
        tx.commit().await?;

        info!("Entity graph reset");
        Ok(())
    }

    // ========== Scheme Operations ==========

    async fn list_concept_schemes(&self) -> Result<Vec<ConceptScheme>> {
        let rows: Vec<SchemeRow> =
            sqlx::query_as(&format!("SELECT {SCHEME_COLUMNS} FROM concept_schemes cs ORDER BY cs.iri"))
                .fetch_all(&self.pool)
                .await?;

        rows.into_iter().map(|r| r.into_scheme()).collect()
    }

    async fn get_concept_scheme(&self, iri: &str) -> Result<Option<SchemeWithMembers>> {
        let row: Option<SchemeRow> =
            sqlx::query_as(&format!("SELECT {SCHEME_COLUMNS} FROM concept_schemes cs WHERE cs.iri = ?"))
                .bind(iri)
                .fetch_optional(&self.pool)
                .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let member_rows: Vec<MemberRow> = sqlx::query_as(&format!(
            "{MEMBER_SELECT} JOIN in_scheme s ON s.member_iri = m.iri WHERE s.scheme_iri = ? ORDER BY m.iri"
        ))
        .bind(iri)
        .fetch_all(&self.pool)
        .await?;

        Ok(Some(SchemeWithMembers {
            scheme: row.into_scheme()?,
            members: member_rows
                .into_iter()
                .map(|r| r.into_member())
                .collect::<Result<_>>()?,
        }))
    }

    // ========== Member Operations ==========

    async fn get_collection(&self, iri: &str) -> Result<Option<CollectionWithMembers>> {
        let Some(mut collection) = self.fetch_member(iri, MemberType::Collection).await? else {
            return Ok(None);
        };

        let member_rows: Vec<MemberRow> = sqlx::query_as(&format!(
            "{MEMBER_SELECT} JOIN in_collection ic ON ic.member_iri = m.iri WHERE ic.collection_iri = ? ORDER BY ic.rowid"
        ))
        .bind(iri)
        .fetch_all(&self.pool)
        .await?;

        let members: Vec<Member> = member_rows
            .into_iter()
            .map(|r| r.into_member())
            .collect::<Result<_>>()?;

        collection.kind = MemberKind::Collection(CollectionData {
            member_iris: members.iter().map(|m| m.iri.clone()).collect(),
        });

        Ok(Some(CollectionWithMembers {
            collection,
            members,
        }))
    }

    async fn get_concept(&self, iri: &str) -> Result<Option<ConceptWithSchemes>> {
        let Some(concept) = self.fetch_member(iri, MemberType::Concept).await? else {
            return Ok(None);
        };

        let scheme_rows: Vec<SchemeRow> = sqlx::query_as(&format!(
            "SELECT {SCHEME_COLUMNS} FROM concept_schemes cs \
             JOIN in_scheme s ON s.scheme_iri = cs.iri WHERE s.member_iri = ? ORDER BY cs.iri"
        ))
        .bind(iri)
        .fetch_all(&self.pool)
        .await?;

        Ok(Some(ConceptWithSchemes {
            concept,
            schemes: scheme_rows
                .into_iter()
                .map(|r| r.into_scheme())
                .collect::<Result<_>>()?,
        }))
    }

    async fn get_relations(&self, concept_iri: &str) -> Result<Vec<SemanticRelation>> {
        let rows: Vec<RelationRow> = sqlx::query_as(
            r#"
            SELECT type AS relation_type, source_concept_iri, target_concept_iri
            FROM semantic_relations
            WHERE source_concept_iri = ? OR target_concept_iri = ?
            ORDER BY source_concept_iri, type, target_concept_iri
            "#,
        )
        .bind(concept_iri)
        .bind(concept_iri)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(|r| r.into_relation()).collect()
    }

    // ========== Search Operations ==========

    async fn search_concepts(
        &self,
        term: &str,
        lang: &str,
        case_sensitive: bool,
    ) -> Result<Vec<Member>> {
        let rows: Vec<MemberRow> =
            sqlx::query_as(&format!("{MEMBER_SELECT} WHERE m.member_type = 'concept' ORDER BY m.iri"))
                .fetch_all(&self.pool)
                .await?;

        let mut matches = Vec::new();
        for row in rows {
            let member = row.into_member()?;
            if member.matches_label(term, lang, case_sensitive) {
                matches.push(member);
            }
        }
        Ok(matches)
    }

    // ========== Statistics ==========

    async fn stats(&self) -> Result<GraphStats> {
        Ok(GraphStats {
            concept_schemes: self.count("concept_schemes").await?,
            concepts: self.count("concepts").await?,
            collections: self.count("collections").await?,
            semantic_relations: self.count("semantic_relations").await?,
            in_scheme: self.count("in_scheme").await?,
            in_collection: self.count("in_collection").await?,
        })
    }
}

fn decode_json<T: DeserializeOwned>(table: &'static str, raw: &str) -> Result<T> {
    serde_json::from_str(raw).map_err(|e| Error::CorruptRow {
        table,
        reason: e.to_string(),
    })
}

// ========== Database Row Types ==========

#[derive(Debug, FromRow)]
struct SchemeRow {
    iri: String,
    notation: String,
    scope_note: String,
    pref_labels: String,
}

impl SchemeRow {
    fn into_scheme(self) -> Result<ConceptScheme> {
        Ok(ConceptScheme {
            pref_labels: decode_json("concept_schemes", &self.pref_labels)?,
            iri: self.iri,
            notation: self.notation,
            scope_note: self.scope_note,
        })
    }
}

#[derive(Debug, FromRow)]
struct MemberRow {
    iri: String,
    notation: String,
    pref_labels: String,
    member_type: String,
    identifier: Option<String>,
    alt_labels: Option<String>,
    scope_notes: Option<String>,
}

impl MemberRow {
    fn into_member(self) -> Result<Member> {
        let member_type = MemberType::parse(&self.member_type).ok_or_else(|| Error::CorruptRow {
            table: "collection_members",
            reason: format!("Invalid member type: {}", self.member_type),
        })?;

        let kind = match member_type {
            MemberType::Concept => MemberKind::Concept(ConceptData {
                identifier: self.identifier.unwrap_or_default(),
                alt_labels: match self.alt_labels {
                    Some(raw) => decode_json("concepts", &raw)?,
                    None => Default::default(),
                },
                scope_notes: match self.scope_notes {
                    Some(raw) => decode_json("concepts", &raw)?,
                    None => Default::default(),
                },
            }),
            MemberType::Collection => MemberKind::Collection(CollectionData::default()),
        };

        Ok(Member {
            pref_labels: decode_json("collection_members", &self.pref_labels)?,
            iri: self.iri,
            notation: self.notation,
            kind,
        })
    }
}

#[derive(Debug, FromRow)]
struct RelationRow {
    relation_type: String,
    source_concept_iri: String,
    target_concept_iri: String,
}

impl RelationRow {
    fn into_relation(self) -> Result<SemanticRelation> {
        let relation_type =
            SemanticRelationType::parse(&self.relation_type).ok_or_else(|| Error::CorruptRow {
                table: "semantic_relations",
                reason: format!("Invalid relation type: {}", self.relation_type),
            })?;

        Ok(SemanticRelation {
            relation_type,
            source_concept_iri: self.source_concept_iri,
            target_concept_iri: self.target_concept_iri,
        })
    }
}
