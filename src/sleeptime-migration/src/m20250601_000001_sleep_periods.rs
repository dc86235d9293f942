use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(SleepPeriods::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(SleepPeriods::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(SleepPeriods::Start)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(SleepPeriods::End)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-sleep_periods-start-end")
                    .table(SleepPeriods::Table)
                    .col(SleepPeriods::Start)
                    .col(SleepPeriods::End)
                    .unique()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(SleepPeriods::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
pub enum SleepPeriods {
    Table,
    Id,
    Start,
    End,
}
