// Transport variants behind the connection service
pub(crate) mod hub;
pub(crate) mod socket;

use tokio::net::TcpStream;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use url::Url;

use tradewire_common::Result;

pub(crate) type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

pub(crate) async fn connect(url: &str) -> Result<WsStream> {
    let url = Url::parse(url)?;
    let (stream, _) = connect_async(url).await?;
    Ok(stream)
}
