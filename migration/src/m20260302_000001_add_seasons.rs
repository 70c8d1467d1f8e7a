use sea_orm_migration::prelude::*;

/// Seasons (赛季，按日期范围圈定排行榜)
#[derive(DeriveIden)]
enum Seasons {
    Table,
    Id,
    Name,
    StartDate,
    EndDate,
    CreatedAt,
    UpdatedAt,
}

/// Season Participants (赛季报名表)
#[derive(DeriveIden)]
enum SeasonParticipants {
    Table,
    Id,
    SeasonId,
    UserId,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Users {
    Table,
    Id,
}

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Seasons::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Seasons::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Seasons::Name).string_len(100).not_null())
                    .col(ColumnDef::new(Seasons::StartDate).date().not_null())
                    .col(ColumnDef::new(Seasons::EndDate).date().not_null())
                    .col(
                        ColumnDef::new(Seasons::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::cust("NOW()")),
                    )
                    .col(
                        ColumnDef::new(Seasons::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::cust("NOW()")),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_seasons_name_unique")
                    .table(Seasons::Table)
                    .col(Seasons::Name)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(SeasonParticipants::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(SeasonParticipants::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(SeasonParticipants::SeasonId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(SeasonParticipants::UserId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(SeasonParticipants::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::cust("NOW()")),
                    )
                    .to_owned(),
            )
            .await?;

        // 同一赛季不重复报名
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_season_participants_season_user_unique")
                    .table(SeasonParticipants::Table)
                    .col(SeasonParticipants::SeasonId)
                    .col(SeasonParticipants::UserId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .alter_table(
                Table::alter()
                    .table(SeasonParticipants::Table)
                    .add_foreign_key(
                        TableForeignKey::new()
                            .name("fk_season_participants_season")
                            .from_tbl(SeasonParticipants::Table)
                            .from_col(SeasonParticipants::SeasonId)
                            .to_tbl(Seasons::Table)
                            .to_col(Seasons::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .alter_table(
                Table::alter()
                    .table(SeasonParticipants::Table)
                    .add_foreign_key(
                        TableForeignKey::new()
                            .name("fk_season_participants_user")
                            .from_tbl(SeasonParticipants::Table)
                            .from_col(SeasonParticipants::UserId)
                            .to_tbl(Users::Table)
                            .to_col(Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(
                Table::drop()
                    .if_exists()
                    .table(SeasonParticipants::Table)
                    .to_owned(),
            )
            .await?;
        manager
            .drop_table(Table::drop().if_exists().table(Seasons::Table).to_owned())
            .await?;
        Ok(())
    }
}
