use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        for statement in catalog_tables() {
            manager.create_table(statement).await?;
        }

        log::info!("Created hardware catalog tables");
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Dependents first
        for table in Catalog::ALL.iter().rev() {
            manager
                .drop_table(Table::drop().table(*table).if_exists().to_owned())
                .await?;
        }

        Ok(())
    }
}

/// Create statements for every catalog table, referenced tables first.
fn catalog_tables() -> Vec<TableCreateStatement> {
    vec![
        lookup_table(Catalog::CpuBrand),
        lookup_table(Catalog::CpuFamily),
        Table::create()
            .table(Catalog::Cpu)
            .if_not_exists()
            .col(pk_auto(Col::Id))
            .col(string(Col::Model))
            .col(string(Col::Speed))
            .col(integer(Col::CoreCount))
            .col(string_null(Col::Serial))
            .col(integer_null(Col::CpuBrandId))
            .col(integer_null(Col::CpuFamilyId))
            .foreign_key(&mut reference(Catalog::Cpu, Col::CpuBrandId, Catalog::CpuBrand))
            .foreign_key(&mut reference(Catalog::Cpu, Col::CpuFamilyId, Catalog::CpuFamily))
            .to_owned(),
        lookup_table(Catalog::GpuManufacturer),
        lookup_table(Catalog::GpuBrand),
        lookup_table(Catalog::GpuVramType),
        Table::create()
            .table(Catalog::Gpu)
            .if_not_exists()
            .col(pk_auto(Col::Id))
            .col(string(Col::VramSize))
            .col(string_null(Col::Serial))
            .col(integer_null(Col::GpuManufacturerId))
            .col(integer_null(Col::GpuBrandId))
            .col(integer_null(Col::GpuVramTypeId))
            .foreign_key(&mut reference(
                Catalog::Gpu,
                Col::GpuManufacturerId,
                Catalog::GpuManufacturer,
            ))
            .foreign_key(&mut reference(Catalog::Gpu, Col::GpuBrandId, Catalog::GpuBrand))
            .foreign_key(&mut reference(
                Catalog::Gpu,
                Col::GpuVramTypeId,
                Catalog::GpuVramType,
            ))
            .to_owned(),
        lookup_table(Catalog::MotherboardManufacturer),
        lookup_table(Catalog::MotherboardChipset),
        Table::create()
            .table(Catalog::Motherboard)
            .if_not_exists()
            .col(pk_auto(Col::Id))
            .col(string(Col::Model))
            .col(string_null(Col::Serial))
            .col(integer_null(Col::MotherboardManufacturerId))
            .col(integer_null(Col::MotherboardChipsetId))
            .foreign_key(&mut reference(
                Catalog::Motherboard,
                Col::MotherboardManufacturerId,
                Catalog::MotherboardManufacturer,
            ))
            .foreign_key(&mut reference(
                Catalog::Motherboard,
                Col::MotherboardChipsetId,
                Catalog::MotherboardChipset,
            ))
            .to_owned(),
        lookup_table(Catalog::Ram),
        lookup_table(Catalog::Disk),
        lookup_table(Catalog::Os),
        config_table(),
        lookup_table(Catalog::BenchmarkTarget),
        Table::create()
            .table(Catalog::Benchmark)
            .if_not_exists()
            .col(pk_auto(Col::Id))
            .col(string(Col::Name))
            .col(integer_null(Col::BenchmarkTargetId))
            .foreign_key(&mut reference(
                Catalog::Benchmark,
                Col::BenchmarkTargetId,
                Catalog::BenchmarkTarget,
            ))
            .to_owned(),
        Table::create()
            .table(Catalog::BenchmarkResult)
            .if_not_exists()
            .col(pk_auto(Col::Id))
            .col(integer(Col::BenchmarkId))
            .col(integer(Col::ConfigId))
            .col(double(Col::Result))
            .col(string_null(Col::Timestamp))
            .col(string_null(Col::Notes))
            // Results cannot outlive the benchmark or configuration they measure
            .foreign_key(
                reference(Catalog::BenchmarkResult, Col::BenchmarkId, Catalog::Benchmark)
                    .on_delete(ForeignKeyAction::Cascade),
            )
            .foreign_key(
                reference(Catalog::BenchmarkResult, Col::ConfigId, Catalog::Config)
                    .on_delete(ForeignKeyAction::Cascade),
            )
            .to_owned(),
    ]
}

/// A configuration composes one part of each kind plus driver and clock notes.
fn config_table() -> TableCreateStatement {
    let mut table = Table::create();
    table
        .table(Catalog::Config)
        .if_not_exists()
        .col(pk_auto(Col::Id))
        .col(string_uniq(Col::Name));

    for (column, target) in [
        (Col::CpuId, Catalog::Cpu),
        (Col::MotherboardId, Catalog::Motherboard),
        (Col::GpuId, Catalog::Gpu),
        (Col::DiskId, Catalog::Disk),
        (Col::OsId, Catalog::Os),
        (Col::RamTypeId, Catalog::Ram),
    ] {
        table
            .col(integer_null(column))
            .foreign_key(&mut reference(Catalog::Config, column, target));
    }

    table
        .col(string(Col::RamSize))
        .col(string_null(Col::CpuDriverVersion))
        .col(string_null(Col::MbChipsetDriverVersion))
        .col(string_null(Col::GpuDriverVersion));

    for (overclocked, base, current) in [
        (Col::CpuOverclock, Col::CpuBaseclock, Col::CpuCurrentclock),
        (
            Col::GpuCoreOverclock,
            Col::GpuCoreBaseclock,
            Col::GpuCoreCurrentclock,
        ),
        (
            Col::GpuVramOverclock,
            Col::GpuVramBaseclock,
            Col::GpuVramCurrentclock,
        ),
    ] {
        table
            .col(boolean(overclocked).default(false))
            .col(integer_null(base))
            .col(integer_null(current));
    }

    table.col(text_null(Col::Notes)).to_owned()
}

/// An `id` plus unique `name` table, the shape of every brand, family and kind lookup.
fn lookup_table(table: Catalog) -> TableCreateStatement {
    Table::create()
        .table(table)
        .if_not_exists()
        .col(pk_auto(Col::Id))
        .col(string_uniq(Col::Name))
        .to_owned()
}

/// Nullable-friendly reference: deleting a referenced row leaves the dependent row in place.
fn reference(from: Catalog, column: Col, to: Catalog) -> ForeignKeyCreateStatement {
    ForeignKey::create()
        .name(format!("fk_{}_{}", from.to_string(), column.to_string()))
        .from(from, column)
        .to(to, Col::Id)
        .on_delete(ForeignKeyAction::SetNull)
        .on_update(ForeignKeyAction::Cascade)
        .to_owned()
}

#[derive(DeriveIden, Clone, Copy)]
enum Catalog {
    #[sea_orm(iden = "cpubrand")]
    CpuBrand,
    #[sea_orm(iden = "cpufamily")]
    CpuFamily,
    #[sea_orm(iden = "cpu")]
    Cpu,
    #[sea_orm(iden = "gpumanufacturer")]
    GpuManufacturer,
    #[sea_orm(iden = "gpubrand")]
    GpuBrand,
    #[sea_orm(iden = "gpuvramtype")]
    GpuVramType,
    #[sea_orm(iden = "gpu")]
    Gpu,
    #[sea_orm(iden = "motherboardmanufacturer")]
    MotherboardManufacturer,
    #[sea_orm(iden = "motherboardchipset")]
    MotherboardChipset,
    #[sea_orm(iden = "motherboard")]
    Motherboard,
    #[sea_orm(iden = "ram")]
    Ram,
    #[sea_orm(iden = "disk")]
    Disk,
    #[sea_orm(iden = "os")]
    Os,
    #[sea_orm(iden = "config")]
    Config,
    #[sea_orm(iden = "benchmarktarget")]
    BenchmarkTarget,
    #[sea_orm(iden = "benchmark")]
    Benchmark,
    #[sea_orm(iden = "benchmarkresult")]
    BenchmarkResult,
}

impl Catalog {
    /// Creation order.
    const ALL: [Catalog; 17] = [
        Catalog::CpuBrand,
        Catalog::CpuFamily,
        Catalog::Cpu,
        Catalog::GpuManufacturer,
        Catalog::GpuBrand,
        Catalog::GpuVramType,
        Catalog::Gpu,
        Catalog::MotherboardManufacturer,
        Catalog::MotherboardChipset,
        Catalog::Motherboard,
        Catalog::Ram,
        Catalog::Disk,
        Catalog::Os,
        Catalog::Config,
        Catalog::BenchmarkTarget,
        Catalog::Benchmark,
        Catalog::BenchmarkResult,
    ];
}

#[derive(DeriveIden, Clone, Copy)]
enum Col {
    Id,
    Name,
    Model,
    Speed,
    CoreCount,
    Serial,
    CpuBrandId,
    CpuFamilyId,
    VramSize,
    GpuManufacturerId,
    GpuBrandId,
    GpuVramTypeId,
    MotherboardManufacturerId,
    MotherboardChipsetId,
    CpuId,
    MotherboardId,
    GpuId,
    DiskId,
    OsId,
    RamTypeId,
    RamSize,
    CpuDriverVersion,
    MbChipsetDriverVersion,
    GpuDriverVersion,
    CpuOverclock,
    CpuBaseclock,
    CpuCurrentclock,
    GpuCoreOverclock,
    GpuCoreBaseclock,
    GpuCoreCurrentclock,
    GpuVramOverclock,
    GpuVramBaseclock,
    GpuVramCurrentclock,
    Notes,
    BenchmarkTargetId,
    BenchmarkId,
    ConfigId,
    Result,
    Timestamp,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn creates_every_catalog_table_in_dependency_order() {
        let statements = catalog_tables();
        assert_eq!(statements.len(), Catalog::ALL.len());

        for (statement, table) in statements.iter().zip(Catalog::ALL) {
            let sql = statement.to_string(PostgresQueryBuilder);
            assert!(
                sql.starts_with(&format!(
                    r#"CREATE TABLE IF NOT EXISTS "{}""#,
                    table.to_string()
                )),
                "unexpected statement order: {sql}"
            );
        }
    }

    #[test]
    fn lookup_tables_have_unique_names() {
        let sql = lookup_table(Catalog::CpuBrand).to_string(PostgresQueryBuilder);
        assert!(sql.contains(r#""name" varchar"#), "{sql}");
        assert!(sql.contains("UNIQUE"), "{sql}");
    }

    #[test]
    fn references_are_named_after_the_referencing_column() {
        let sql = catalog_tables()[2].to_string(MysqlQueryBuilder);
        assert!(sql.contains("`fk_cpu_cpu_brand_id`"), "{sql}");
        assert!(sql.contains("REFERENCES `cpubrand` (`id`)"), "{sql}");
    }

    #[test]
    fn config_table_carries_overclock_flags() {
        let sql = config_table().to_string(PostgresQueryBuilder);
        for column in ["cpu_overclock", "gpu_core_overclock", "gpu_vram_overclock"] {
            assert!(
                sql.contains(&format!(r#""{column}" bool NOT NULL DEFAULT"#)),
                "{column} missing from {sql}"
            );
        }
    }
}
