//! [`Holiday`]-related [`Database`] implementations.

use common::{
    operations::{By, Insert, Select},
    Date,
};
use tracerr::Traced;

use crate::{
    domain::Holiday,
    infra::{
        database::{self, postgres::Connection, Postgres},
        Database,
    },
};

impl<C> Database<Select<By<Option<Holiday>, Date>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = Option<Holiday>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Holiday>, Date>>,
    ) -> Result<Self::Ok, Self::Err> {
        let date = by.into_inner();

        const SQL: &str = "\
            SELECT date, name \
            FROM holidays \
            WHERE date = $1::DATE";
        Ok(self
            .query_opt(SQL, &[&date])
            .await
            .map_err(tracerr::wrap!())?
            .map(|row| Holiday {
                date: row.get("date"),
                name: row.get("name"),
            }))
    }
}

impl<C> Database<Insert<Holiday>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(holiday): Insert<Holiday>,
    ) -> Result<Self::Ok, Self::Err> {
        const SQL: &str = "\
            INSERT INTO holidays (date, name) \
            VALUES ($1::DATE, $2::VARCHAR) \
            ON CONFLICT (date) DO UPDATE \
            SET name = EXCLUDED.name";
        self.exec(SQL, &[&holiday.date, &holiday.name])
            .await
            .map_err(tracerr::wrap!())
            .map(drop)
    }
}
