use std::sync::Arc;

use chrono::{Local, NaiveDateTime};
use tracing::{error, info, instrument, warn};

use super::report::{FailedRecord, MigrationReport, PassReport};
use crate::db::{GodpackRecord, GodpackStore, UserRecord, UserStore};
use crate::legacy::{
    LegacyDocumentReader, LegacyError, SkipReason, SkippedRecord, godpack_elements, map_godpack,
    map_user, record_key, user_elements,
};

type Candidate<T> = Result<T, SkippedRecord>;

/// Moves the legacy XML data into the stores. Each file is an independent
/// pass and each element is migrated on its own: one bad element is
/// recorded in the report and the rest carry on.
pub struct MigrationEngine {
    reader: LegacyDocumentReader,
    users: Arc<dyn UserStore>,
    godpacks: Arc<dyn GodpackStore>,
}

impl MigrationEngine {
    pub fn new(
        reader: LegacyDocumentReader,
        users: Arc<dyn UserStore>,
        godpacks: Arc<dyn GodpackStore>,
    ) -> Self {
        Self {
            reader,
            users,
            godpacks,
        }
    }

    #[instrument(name = "migration.migrate", skip(self))]
    pub async fn migrate(&self) -> MigrationReport {
        let users = self.migrate_users().await;
        let godpacks = self.migrate_godpacks().await;
        let report = MigrationReport { users, godpacks };

        if report.succeeded() {
            info!(
                users = report.users.migrated,
                godpacks = report.godpacks.migrated,
                "migration completed"
            );
        } else {
            error!("migration finished with a failed pass");
        }
        report
    }

    // Parsing happens up front so no borrowed XML is held across store calls.
    fn user_candidates(&self) -> Result<Option<Vec<Candidate<UserRecord>>>, LegacyError> {
        let Some(document) = self.reader.read_users()? else {
            return Ok(None);
        };
        let parsed = document.parse()?;
        Ok(Some(
            user_elements(&parsed)
                .map(|node| {
                    map_user(node).map_err(|reason| SkippedRecord::new(record_key(node, "id"), reason))
                })
                .collect(),
        ))
    }

    fn godpack_candidates(
        &self,
        now: NaiveDateTime,
    ) -> Result<Option<Vec<Candidate<GodpackRecord>>>, LegacyError> {
        let Some(document) = self.reader.read_server()? else {
            return Ok(None);
        };
        let parsed = document.parse()?;
        Ok(Some(
            godpack_elements(&parsed)
                .into_iter()
                .map(|node| {
                    map_godpack(node, now)
                        .map_err(|reason| SkippedRecord::new(record_key(node, "messageId"), reason))
                })
                .collect(),
        ))
    }

    async fn migrate_users(&self) -> PassReport {
        let source = self.reader.users_file();
        let candidates = match self.user_candidates() {
            Ok(Some(candidates)) => candidates,
            Ok(None) => {
                info!("{} not found - skipping user migration", source);
                return PassReport::source_missing(source);
            }
            Err(e) => {
                error!("error reading {}: {}", source, e);
                return PassReport::failed(source, e.to_string());
            }
        };

        let mut report = PassReport::new(source);
        report.seen = candidates.len();
        for candidate in candidates {
            let user = match candidate {
                Ok(user) => user,
                Err(skipped) => {
                    warn!("skipping user {}: {}", skipped.key, skipped.reason);
                    report.skipped.push(skipped);
                    continue;
                }
            };

            let key = user.discord_id.to_string();
            if let Err(e) = self.users.add_user(&user).await {
                error!("error migrating user {}: {}", key, e);
                report.failed.push(FailedRecord {
                    key,
                    error: e.to_string(),
                });
                continue;
            }

            match self.users.update_user_status(user.discord_id, &user.status).await {
                Ok(true) => {}
                Ok(false) => warn!(
                    "user {} migrated without status {:?}",
                    key, user.status
                ),
                Err(e) => {
                    error!("error setting status for user {}: {}", key, e);
                    report.failed.push(FailedRecord {
                        key,
                        error: e.to_string(),
                    });
                    continue;
                }
            }
            report.migrated += 1;
        }

        info!("migrated {} users from {}", report.migrated, source);
        report
    }

    async fn migrate_godpacks(&self) -> PassReport {
        let source = self.reader.server_file();
        let now = Local::now().naive_local();
        let candidates = match self.godpack_candidates(now) {
            Ok(Some(candidates)) => candidates,
            Ok(None) => {
                info!("{} not found - skipping godpack migration", source);
                return PassReport::source_missing(source);
            }
            Err(e) => {
                error!("error reading {}: {}", source, e);
                return PassReport::failed(source, e.to_string());
            }
        };

        let mut report = PassReport::new(source);
        report.seen = candidates.len();
        for candidate in candidates {
            let godpack = match candidate {
                Ok(godpack) => godpack,
                Err(skipped) => {
                    warn!("skipping godpack {}: {}", skipped.key, skipped.reason);
                    report.skipped.push(skipped);
                    continue;
                }
            };

            let key = godpack.message_id.to_string();
            match self.godpacks.add_godpack(&godpack).await {
                Ok(Some(_)) => report.migrated += 1,
                Ok(None) => report
                    .skipped
                    .push(SkippedRecord::new(key, SkipReason::AlreadyPresent)),
                Err(e) => {
                    error!("error migrating godpack {}: {}", key, e);
                    report.failed.push(FailedRecord {
                        key,
                        error: e.to_string(),
                    });
                }
            }
        }

        info!("migrated {} godpacks from {}", report.migrated, source);
        report
    }
}
