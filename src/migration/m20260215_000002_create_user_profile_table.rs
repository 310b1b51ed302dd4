use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(UserProfile::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(UserProfile::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(UserProfile::UserId).text().not_null())
                    .col(ColumnDef::new(UserProfile::Nickname).string_len(50).not_null())
                    .col(
                        ColumnDef::new(UserProfile::PreferredLanguage)
                            .string_len(10)
                            .not_null(),
                    )
                    .col(ColumnDef::new(UserProfile::ReadingLanguages).json_binary().null())
                    .col(ColumnDef::new(UserProfile::LearningStyle).json_binary().null())
                    .col(ColumnDef::new(UserProfile::LovedGenres).json_binary().null())
                    .col(ColumnDef::new(UserProfile::DislikedGenres).json_binary().null())
                    .col(ColumnDef::new(UserProfile::TonePreference).string_len(30).null())
                    .col(ColumnDef::new(UserProfile::LearningGoals).string_len(300).null())
                    .col(ColumnDef::new(UserProfile::FavoriteAuthors).string_len(200).null())
                    .col(ColumnDef::new(UserProfile::AboutMe).string_len(400).null())
                    .col(
                        ColumnDef::new(UserProfile::AgentProfileCompact)
                            .json_binary()
                            .not_null()
                            .default("{}"),
                    )
                    .col(
                        ColumnDef::new(UserProfile::AgentProfileVersion)
                            .integer()
                            .not_null()
                            .default(1),
                    )
                    .col(
                        ColumnDef::new(UserProfile::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(UserProfile::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("ux_user_profile_user_id")
                    .table(UserProfile::Table)
                    .col(UserProfile::UserId)
                    .unique()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(UserProfile::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum UserProfile {
    Table,
    Id,
    UserId,
    Nickname,
    PreferredLanguage,
    ReadingLanguages,
    LearningStyle,
    LovedGenres,
    DislikedGenres,
    TonePreference,
    LearningGoals,
    FavoriteAuthors,
    AboutMe,
    AgentProfileCompact,
    AgentProfileVersion,
    CreatedAt,
    UpdatedAt,
}
